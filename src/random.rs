//! Random sources for stochastic simulation passes.
//!
//! The simulation only needs two primitives, an integer draw and a jitter
//! vector, so it takes them through the small [`RandomSource`] trait. Tests
//! can plug in scripted sources; runs use [`SeededRandom`].

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Random capability consumed by [`GrowthSimulation`](crate::GrowthSimulation).
pub trait RandomSource {
    /// Uniform integer in `[low, high)`.
    fn uniform(&mut self, low: i32, high: i32) -> i32;

    /// Uniform point in the cube `[-0.5, 0.5]³`.
    fn rand_unit_cube(&mut self) -> Vec3;
}

/// Reproducible random source backed by [`SmallRng`].
#[derive(Clone, Debug)]
pub struct SeededRandom {
    seed: u64,
    rng: SmallRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Seed this source was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RandomSource for SeededRandom {
    #[inline]
    fn uniform(&mut self, low: i32, high: i32) -> i32 {
        self.rng.gen_range(low..high)
    }

    fn rand_unit_cube(&mut self) -> Vec3 {
        Vec3::new(
            self.rng.gen_range(-0.5..0.5),
            self.rng.gen_range(-0.5..0.5),
            self.rng.gen_range(-0.5..0.5),
        )
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn uniform(&mut self, low: i32, high: i32) -> i32 {
        (**self).uniform(low, high)
    }

    fn rand_unit_cube(&mut self) -> Vec3 {
        (**self).rand_unit_cube()
    }
}
