//! # cellgrid
//!
//! Uniform spatial grid indexing and an agent-based cell growth simulation
//! built on top of it.
//!
//! ## Quick Start
//!
//! ```
//! use cellgrid::prelude::*;
//!
//! let params = SimulationParams::default()
//!     .with_rest_length(1.0)
//!     .with_spring_factor(2.0);
//!
//! let mut sim = GrowthSimulation::seeded(params, 7);
//! for _ in 0..50 {
//!     sim.step(0.01);
//! }
//!
//! // Hand positions and links to a renderer.
//! let snapshot = sim.snapshot();
//! assert_eq!(snapshot.particles.len(), sim.particles().len());
//! ```
//!
//! ## Core Concepts
//!
//! ### Uniform grid
//!
//! [`UniformGrid`] cuts a cube (or an explicit bounding box) into equal
//! buckets and records ids in every bucket their extent overlaps. Queries
//! union the buckets covered by a query extent; [`BucketView::traverse_ray`]
//! walks the buckets along a ray.
//!
//! ```
//! use cellgrid::{BucketView, UniformGrid, Vec3};
//!
//! let mut grid = UniformGrid::new(1.0, 8);
//! grid.insert(Vec3::new(0.5, 0.5, 0.5), 0.0, 1);
//! grid.insert(Vec3::new(-0.5, 0.0, 0.0), 0.2, 2);
//! assert_eq!(grid.query(Vec3::new(0.5, 0.5, 0.5), 0.1), vec![1]);
//! ```
//!
//! ### Packed grid
//!
//! [`UniformGrid::pack`] produces a [`PackedGrid`]: one `(offset, count)`
//! table entry per bucket plus a single id buffer. It answers the same
//! queries, and its buffers can be shipped to worker threads or a GPU as-is.
//!
//! ### Growth simulation
//!
//! [`GrowthSimulation`] owns particle positions and a [`LinkSet`] of springs.
//! Each [`step`](GrowthSimulation::step) rebuilds a grid, applies repulsion
//! between neighbors, spring attraction along links, and stochastic division
//! of low-stress cells. Randomness comes from a [`RandomSource`], so runs are
//! reproducible for a given seed.
//!
//! ## Feature Overview
//!
//! | Area | Types |
//! |------|-------|
//! | Indexing | [`GridLayout`], [`UniformGrid`], [`BucketView`] |
//! | Bulk access | [`PackedGrid`], [`ArenaEntry`], [`PackedGridHeader`] |
//! | Simulation | [`GrowthSimulation`], [`SimulationParams`], [`StepStats`], [`LinkSet`] |
//! | Export | [`Snapshot`] |
//! | Runs | [`RunConfig`] |

pub mod config;
mod error;
pub mod layout;
pub mod links;
pub mod packed;
pub mod random;
pub mod simulation;
mod snapshot;
pub mod spatial;

pub use bytemuck;
pub use config::RunConfig;
pub use error::{ConfigError, SnapshotError};
pub use glam::{UVec3, Vec3};
pub use layout::{CellRange, GridLayout};
pub use links::{Link, LinkSet};
pub use packed::{ArenaEntry, PackedGrid, PackedGridHeader};
pub use random::{RandomSource, SeededRandom};
pub use simulation::{GrowthSimulation, SimulationParams, StepStats};
pub use snapshot::Snapshot;
pub use spatial::{BucketView, UniformGrid};

/// Convenient re-exports for common usage.
///
/// ```
/// use cellgrid::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::RunConfig;
    pub use crate::layout::GridLayout;
    pub use crate::links::{Link, LinkSet};
    pub use crate::packed::PackedGrid;
    pub use crate::random::{RandomSource, SeededRandom};
    pub use crate::simulation::{GrowthSimulation, SimulationParams, StepStats};
    pub use crate::snapshot::Snapshot;
    pub use crate::spatial::{BucketView, UniformGrid};
    pub use crate::{UVec3, Vec3};
}
