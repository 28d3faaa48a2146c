//! Agent-based cell growth simulation.
//!
//! Particles are cells; links are springs between them. Every step rebuilds a
//! [`UniformGrid`] over the current extent of the system and then runs, in
//! order:
//!
//! 1. **Repulsion**: every pair closer than one grid query of `rest_length`
//!    pushes apart. Pairs that come within `0.9 * rest_length` bond.
//! 2. **Attraction**: every link acts as a spring toward `rest_length`.
//! 3. **Planarization** (optional): linked cells relax toward the mean of
//!    their partners.
//! 4. **Division**: low-stress cells split with probability 1/10.
//! 5. **Confinement** (optional): cells are pushed back into a cylinder.
//!
//! Forces always read the positions from the start of the step; displacements
//! accumulate into a fresh position buffer that replaces the old one at the
//! end. Cells created by division join the force passes on the next step.
//!
//! # Example
//!
//! ```
//! use cellgrid::{GrowthSimulation, SimulationParams};
//!
//! let params = SimulationParams::default().with_rest_length(1.0).with_cell_radius(0.5);
//! let mut sim = GrowthSimulation::seeded(params, 42);
//! for _ in 0..10 {
//!     sim.step(0.01);
//! }
//! assert!(sim.particles().len() >= 2);
//! ```

use crate::error::ConfigError;
use crate::links::{Link, LinkSet};
use crate::random::{RandomSource, SeededRandom};
use crate::snapshot::Snapshot;
use crate::spatial::{BucketView, UniformGrid};
use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Pairs closer than this fraction of `rest_length` form a link.
pub const AUTO_BOND_FRACTION: f32 = 0.9;
/// A cell divides when a draw in `[0, DIVISION_ODDS)` comes up zero.
pub const DIVISION_ODDS: i32 = 10;
/// Cells whose force tally reaches this value do not divide.
pub const LOW_STRESS_THRESHOLD: f32 = 20.0;
/// Scale of the jitter applied to a daughter cell.
pub const DIVISION_JITTER: f32 = 1.0e-3;

/// Physical constants of a growth run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Preferred distance between linked cells; also the neighbor query radius.
    pub rest_length: f32,
    /// Spring stiffness of links.
    pub spring_factor: f32,
    /// Strength of pairwise repulsion.
    pub repell_factor: f32,
    /// Strength of the planarization pass (0 disables it).
    pub planar_factor: f32,
    /// Carried with the parameters; not used by the force model.
    pub bulge_factor: f32,
    /// Radius of the two seed cells.
    pub cell_radius: f32,
    /// Mass multiplier applied to every force.
    pub cell_mass: f32,
    /// Radius of the confining cylinder (0 disables confinement).
    pub domain_radius: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            rest_length: 1.0,
            spring_factor: 1.0,
            repell_factor: 1.0,
            planar_factor: 0.0,
            bulge_factor: 0.0,
            cell_radius: 0.5,
            cell_mass: 1.0,
            domain_radius: 0.0,
        }
    }
}

impl SimulationParams {
    pub fn with_rest_length(mut self, rest_length: f32) -> Self {
        self.rest_length = rest_length;
        self
    }

    pub fn with_spring_factor(mut self, spring_factor: f32) -> Self {
        self.spring_factor = spring_factor;
        self
    }

    pub fn with_repell_factor(mut self, repell_factor: f32) -> Self {
        self.repell_factor = repell_factor;
        self
    }

    pub fn with_planar_factor(mut self, planar_factor: f32) -> Self {
        self.planar_factor = planar_factor;
        self
    }

    pub fn with_cell_radius(mut self, cell_radius: f32) -> Self {
        self.cell_radius = cell_radius;
        self
    }

    pub fn with_cell_mass(mut self, cell_mass: f32) -> Self {
        self.cell_mass = cell_mass;
        self
    }

    pub fn with_domain_radius(mut self, domain_radius: f32) -> Self {
        self.domain_radius = domain_radius;
        self
    }

    /// Reject values the step cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("rest_length", self.rest_length),
            ("cell_radius", self.cell_radius),
            ("cell_mass", self.cell_mass),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.domain_radius.is_finite() && self.domain_radius >= 0.0) {
            return Err(ConfigError::Validation(format!(
                "domain_radius must be non-negative, got {}",
                self.domain_radius
            )));
        }
        Ok(())
    }
}

/// Summary of one [`GrowthSimulation::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct StepStats {
    /// Number of completed steps including this one.
    pub step: u64,
    pub particles_before: usize,
    pub particles_after: usize,
    pub divisions: usize,
    /// Links created by close approach during repulsion.
    pub links_formed: usize,
    pub link_count: usize,
    pub system_size: f32,
    /// Largest force tally of any cell this step.
    pub max_stress: f32,
}

/// Repulsion between cell `i` and one neighbor `j > i`.
#[derive(Clone, Copy, Debug)]
struct PairForce {
    j: u32,
    /// Added to `i`, subtracted from `j`.
    displacement: Vec3,
    magnitude: f32,
    bond: bool,
}

/// Particle positions and spring links advanced in discrete steps.
#[derive(Clone, Debug)]
pub struct GrowthSimulation<R: RandomSource = SeededRandom> {
    params: SimulationParams,
    particles: Vec<Vec3>,
    links: LinkSet,
    system_size: f32,
    rng: R,
    /// Force tally of each cell from the last step.
    stress: Vec<f32>,
    step_count: u64,
    parallel: bool,
}

impl GrowthSimulation<SeededRandom> {
    /// Two-cell seed state driven by a [`SeededRandom`].
    pub fn seeded(params: SimulationParams, seed: u64) -> Self {
        Self::new(params, SeededRandom::new(seed))
    }
}

impl<R: RandomSource> GrowthSimulation<R> {
    /// Seed two linked cells at `(0, 0, ±cell_radius)`.
    pub fn new(params: SimulationParams, rng: R) -> Self {
        let mut links = LinkSet::new();
        links.insert(0, 1);
        Self {
            params,
            particles: vec![
                Vec3::new(0.0, 0.0, -params.cell_radius),
                Vec3::new(0.0, 0.0, params.cell_radius),
            ],
            links,
            system_size: params.cell_radius,
            rng,
            stress: vec![0.0; 2],
            step_count: 0,
            parallel: false,
        }
    }

    /// Start from an arbitrary set of cells and links.
    ///
    /// # Panics
    ///
    /// Panics if a link is not ordered (`a < b`) or references a missing
    /// particle. Links are never reordered to make them fit.
    pub fn from_parts<I>(params: SimulationParams, particles: Vec<Vec3>, links: I, rng: R) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut set = LinkSet::new();
        for (a, b) in links {
            assert!(
                (b as usize) < particles.len(),
                "link ({a}, {b}) references a missing particle (count {})",
                particles.len()
            );
            set.insert(a, b);
        }
        let system_size = bounding_radius(&particles) + params.rest_length;
        let count = particles.len();
        Self {
            params,
            particles,
            links: set,
            system_size,
            rng,
            stress: vec![0.0; count],
            step_count: 0,
            parallel: false,
        }
    }

    /// Compute the repulsion pass on the rayon pool.
    ///
    /// Results are identical to the sequential pass.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn particles(&self) -> &[Vec3] {
        &self.particles
    }

    pub fn links(&self) -> &LinkSet {
        &self.links
    }

    /// Bounding half-width used to size the next step's grid.
    pub fn system_size(&self) -> f32 {
        self.system_size
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Force tally of each cell from the last step (0 for cells born in it).
    pub fn stress(&self) -> &[f32] {
        &self.stress
    }

    /// Positions as raw bytes, three `f32` per cell.
    pub fn positions_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }

    /// Copy of the current state for export.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.step_count, self.system_size, &self.particles, &self.links)
    }

    /// Grid over `[-system_size, system_size]³` holding every cell index.
    pub fn build_grid(&self) -> UniformGrid {
        let bins = (2.0 * self.system_size / self.params.rest_length) as u32;
        if bins == 0 {
            trace!(
                system_size = self.system_size,
                "system smaller than one bin, using a single bucket"
            );
        }
        let mut grid = UniformGrid::new(self.system_size, bins.max(1));
        for (i, &position) in self.particles.iter().enumerate() {
            grid.insert(position, 0.0, i as u32);
        }
        grid
    }

    /// Advance the simulation by `dt`.
    pub fn step(&mut self, dt: f32) -> StepStats {
        let count = self.particles.len();
        let grid = self.build_grid();

        let mut new_particles = self.particles.clone();
        let mut stress = vec![0.0f32; count];

        let links_formed = self.repel(&grid, dt, &mut new_particles, &mut stress);
        self.attract(dt, &mut new_particles, &mut stress);
        if self.params.planar_factor != 0.0 {
            self.planarize(dt, &mut new_particles, &mut stress);
        }
        let divisions = self.divide(&stress, &mut new_particles);
        if self.params.domain_radius > 0.0 {
            confine(&mut new_particles, self.params.domain_radius);
        }

        self.particles = new_particles;
        self.system_size = bounding_radius(&self.particles) + self.params.rest_length;
        let max_stress = stress.iter().copied().fold(0.0, f32::max);
        stress.resize(self.particles.len(), 0.0);
        self.stress = stress;
        self.step_count += 1;

        let stats = StepStats {
            step: self.step_count,
            particles_before: count,
            particles_after: self.particles.len(),
            divisions,
            links_formed,
            link_count: self.links.len(),
            system_size: self.system_size,
            max_stress,
        };
        debug!(
            step = stats.step,
            particles = stats.particles_after,
            divisions,
            links_formed,
            links = stats.link_count,
            system_size = stats.system_size,
            "growth step"
        );
        stats
    }

    /// Pairwise repulsion and auto-bonding. Returns the number of new links.
    fn repel(
        &mut self,
        grid: &UniformGrid,
        dt: f32,
        new_particles: &mut [Vec3],
        stress: &mut [f32],
    ) -> usize {
        let particles = &self.particles;
        let params = &self.params;
        let count = particles.len();

        let per_cell: Vec<Vec<PairForce>> = if self.parallel {
            (0..count)
                .into_par_iter()
                .map(|i| pair_forces(particles, grid, params, i, dt))
                .collect()
        } else {
            (0..count).map(|i| pair_forces(particles, grid, params, i, dt)).collect()
        };

        // Apply in ascending i so both modes accumulate in the same order.
        let mut formed = 0;
        for (i, forces) in per_cell.into_iter().enumerate() {
            let mut position = new_particles[i];
            let mut tally = 0.0;
            for force in forces {
                let j = force.j as usize;
                if force.bond && self.links.insert(i as u32, force.j) {
                    trace!(i, j, "auto-bond");
                    formed += 1;
                }
                tally += force.magnitude;
                position += force.displacement;
                new_particles[j] -= force.displacement;
                stress[j] += force.magnitude;
            }
            new_particles[i] = position;
            stress[i] += tally;
        }
        formed
    }

    /// Spring forces along every link.
    fn attract(&self, dt: f32, new_particles: &mut [Vec3], stress: &mut [f32]) {
        let p = &self.params;
        for Link { a, b } in &self.links {
            assert!(a < b, "link invariant violated: ({a}, {b}) is not ordered");
            let (i, j) = (a as usize, b as usize);
            assert!(
                j < self.particles.len(),
                "link ({a}, {b}) references a missing particle (count {})",
                self.particles.len()
            );
            let (p0, p1) = (self.particles[i], self.particles[j]);
            let force = p.spring_factor * p.cell_mass * (p.rest_length - p0.distance(p1));
            let displacement = (p0 - p1) * (force * dt);
            new_particles[i] += displacement;
            new_particles[j] -= displacement;
            stress[i] += force.abs();
            stress[j] += force.abs();
        }
    }

    /// Relax every linked cell toward the centroid of its partners.
    fn planarize(&self, dt: f32, new_particles: &mut [Vec3], stress: &mut [f32]) {
        let p = &self.params;
        let mut targets = vec![(Vec3::ZERO, 0u32); self.particles.len()];
        for Link { a, b } in &self.links {
            let (i, j) = (a as usize, b as usize);
            targets[i].0 += self.particles[j];
            targets[i].1 += 1;
            targets[j].0 += self.particles[i];
            targets[j].1 += 1;
        }
        for (i, &(sum, n)) in targets.iter().enumerate() {
            if n == 0 {
                continue;
            }
            let centroid = sum / n as f32;
            let position = self.particles[i];
            let stretch = p.rest_length - position.distance(centroid);
            let force = p.planar_factor * p.cell_mass * stretch;
            new_particles[i] += (position - centroid) * (force * dt);
            stress[i] += force.abs();
        }
    }

    /// Stochastic division of low-stress cells. Returns the number of daughters.
    fn divide(&mut self, stress: &[f32], new_particles: &mut Vec<Vec3>) -> usize {
        let mut divisions = 0;
        for (i, &position) in self.particles.iter().enumerate() {
            // Draw for every cell so the random stream advances uniformly.
            let draw = self.rng.uniform(0, DIVISION_ODDS);
            if draw == 0 && stress[i] < LOW_STRESS_THRESHOLD {
                let daughter = position + self.rng.rand_unit_cube() * DIVISION_JITTER;
                trace!(parent = i, daughter = new_particles.len(), "division");
                new_particles.push(daughter);
                divisions += 1;
            }
        }
        divisions
    }
}

/// Repulsion contributions of cell `i` with every neighbor `j > i`.
fn pair_forces(
    particles: &[Vec3],
    grid: &UniformGrid,
    params: &SimulationParams,
    i: usize,
    dt: f32,
) -> Vec<PairForce> {
    let p0 = particles[i];
    grid.query(p0, params.rest_length)
        .into_iter()
        .filter(|&j| j as usize > i)
        .map(|j| {
            let p1 = particles[j as usize];
            let dist = p0.distance(p1);
            let force = params.repell_factor * params.cell_mass / (dist * dist + 1.0);
            PairForce {
                j,
                displacement: (p0 - p1) / (dist + 1.0) * force * dt,
                magnitude: force.abs(),
                bond: dist < params.rest_length * AUTO_BOND_FRACTION,
            }
        })
        .collect()
}

/// Project positions into the cylinder `x² + y² <= r²`, `|z| <= r`.
fn confine(particles: &mut [Vec3], radius: f32) {
    for p in particles {
        let planar = (p.x * p.x + p.y * p.y).sqrt();
        let excess = planar - radius;
        if excess > 0.0 {
            let k = excess / planar;
            p.x -= p.x * k;
            p.y -= p.y * k;
        }
        p.z = p.z.clamp(-radius, radius);
    }
}

/// Largest absolute coordinate over all positions.
fn bounding_radius(particles: &[Vec3]) -> f32 {
    particles.iter().map(|p| p.abs().max_element()).fold(0.0, f32::max)
}
