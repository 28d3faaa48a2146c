//! Grid layout: where the lattice sits in space and how positions map to buckets.
//!
//! A layout is shared by [`UniformGrid`](crate::UniformGrid) and
//! [`PackedGrid`](crate::PackedGrid) so both resolve coordinates identically.
//!
//! Two anchorings are supported:
//!
//! - **Centered cube**: `[-size, size]³` split into `n` bins per axis. This is
//!   what the growth simulation rebuilds every step.
//! - **Bounding box**: explicit `min`/`max` with a fixed cell size, used for
//!   indexing geometry (e.g. triangle bounds for a ray tracer).

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Inclusive range of bucket coordinates touched by an extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub min: UVec3,
    pub max: UVec3,
}

impl CellRange {
    /// Iterate every coordinate in the range, x fastest.
    pub fn iter(&self) -> impl Iterator<Item = UVec3> {
        let (lo, hi) = (self.min, self.max);
        (lo.z..=hi.z).flat_map(move |z| {
            (lo.y..=hi.y).flat_map(move |y| (lo.x..=hi.x).map(move |x| UVec3::new(x, y, z)))
        })
    }
}

/// Placement and resolution of a uniform lattice.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Lower corner of the domain.
    pub min: Vec3,
    /// Upper corner of the domain.
    pub max: Vec3,
    /// Edge length of one cubic bucket.
    pub bin_size: f32,
    /// Buckets per axis.
    pub bin_count: UVec3,
}

impl GridLayout {
    /// Cube `[-size, size]³` with `bin_count` buckets per axis.
    pub fn centered(size: f32, bin_count: u32) -> Self {
        assert!(bin_count > 0, "bin count must be positive");
        Self {
            min: Vec3::splat(-size),
            max: Vec3::splat(size),
            bin_size: 2.0 * size / bin_count as f32,
            bin_count: UVec3::splat(bin_count),
        }
    }

    /// Box `[min, max]` cut into cubes of `cell_size`.
    ///
    /// Each axis gets at least one bucket; the last bucket on an axis may
    /// extend past `max`.
    pub fn bounded(min: Vec3, max: Vec3, cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell size must be positive");
        let dims = ((max - min) / cell_size).ceil().max(Vec3::ONE);
        Self {
            min,
            max,
            bin_size: cell_size,
            bin_count: dims.as_uvec3(),
        }
    }

    /// Total number of bucket slots.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.bin_count.x as usize * self.bin_count.y as usize * self.bin_count.z as usize
    }

    /// Upper corner of the last bucket (may exceed `max` for bounded layouts).
    #[inline]
    pub fn lattice_max(&self) -> Vec3 {
        self.min + self.bin_count.as_vec3() * self.bin_size
    }

    /// Flattened slot index of a bucket coordinate: `x + y*nx + z*nx*ny`.
    #[inline]
    pub fn flatten(&self, cell: UVec3) -> usize {
        let n = self.bin_count;
        let (nx, ny) = (n.x as usize, n.y as usize);
        cell.x as usize + cell.y as usize * nx + cell.z as usize * nx * ny
    }

    /// Inverse of [`flatten`](Self::flatten).
    pub fn unflatten(&self, flat: usize) -> UVec3 {
        let nx = self.bin_count.x as usize;
        let ny = self.bin_count.y as usize;
        UVec3::new((flat % nx) as u32, ((flat / nx) % ny) as u32, (flat / (nx * ny)) as u32)
    }

    /// Whether `center ± half_extents` satisfies the domain bound on every axis.
    pub fn admits(&self, center: Vec3, half_extents: Vec3) -> bool {
        center.cmpge(self.min - half_extents).all() && center.cmple(self.max + half_extents).all()
    }

    /// Buckets overlapped by `center ± half_extents`, clipped to the lattice.
    ///
    /// Returns `None` when the extent does not reach the lattice at all.
    pub fn cell_range(&self, center: Vec3, half_extents: Vec3) -> Option<CellRange> {
        let lo = ((center - half_extents - self.min) / self.bin_size).floor();
        let hi = ((center + half_extents - self.min) / self.bin_size).floor();
        // Touching the upper face still counts as overlapping the last bucket.
        let upper = self.max.max(self.lattice_max());
        if hi.cmplt(Vec3::ZERO).any() || (center - half_extents).cmpgt(upper).any() {
            return None;
        }
        let last = (self.bin_count - UVec3::ONE).as_vec3();
        Some(CellRange {
            min: lo.clamp(Vec3::ZERO, last).as_uvec3(),
            max: hi.clamp(Vec3::ZERO, last).as_uvec3(),
        })
    }

    /// World-space corners of a bucket.
    pub fn cell_bounds(&self, cell: UVec3) -> (Vec3, Vec3) {
        let lo = self.min + cell.as_vec3() * self.bin_size;
        (lo, lo + Vec3::splat(self.bin_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_layout() {
        let layout = GridLayout::centered(2.0, 4);
        assert_eq!(layout.bin_size, 1.0);
        assert_eq!(layout.bucket_count(), 64);
        assert_eq!(layout.min, Vec3::splat(-2.0));
    }

    #[test]
    fn test_bounded_layout_counts() {
        let layout = GridLayout::bounded(Vec3::ZERO, Vec3::new(1.0, 0.5, 0.0), 0.3);
        assert_eq!(layout.bin_count, UVec3::new(4, 2, 1));
        assert!(layout.lattice_max().x >= 1.0);
    }

    #[test]
    fn test_flatten_roundtrip_order() {
        let layout = GridLayout::centered(1.0, 3);
        assert_eq!(layout.flatten(UVec3::new(1, 0, 0)), 1);
        assert_eq!(layout.flatten(UVec3::new(0, 1, 0)), 3);
        assert_eq!(layout.flatten(UVec3::new(0, 0, 1)), 9);
        assert_eq!(layout.unflatten(22), UVec3::new(1, 1, 2));
    }

    #[test]
    fn test_boundary_points() {
        let layout = GridLayout::centered(1.0, 4);
        let cell = |p: Vec3| layout.cell_range(p, Vec3::ZERO).map(|r| r.min);
        assert_eq!(cell(Vec3::splat(1.0)), Some(UVec3::splat(3)));
        assert_eq!(cell(Vec3::splat(-1.0)), Some(UVec3::ZERO));
        assert_eq!(cell(Vec3::new(1.01, 0.0, 0.0)), None);
        assert!(!layout.admits(Vec3::new(1.01, 0.0, 0.0), Vec3::ZERO));
    }

    #[test]
    fn test_cell_range_clips_to_lattice() {
        let layout = GridLayout::centered(1.0, 4);
        let range = layout.cell_range(Vec3::new(0.9, 0.0, 0.0), Vec3::splat(0.5)).unwrap();
        assert_eq!(range.min, UVec3::new(2, 1, 1));
        assert_eq!(range.max, UVec3::new(3, 3, 3));
        assert_eq!(range.iter().count(), 2 * 3 * 3);
    }

    #[test]
    fn test_cell_range_outside() {
        let layout = GridLayout::centered(1.0, 4);
        assert!(layout.cell_range(Vec3::new(-3.0, 0.0, 0.0), Vec3::splat(0.5)).is_none());
        assert!(layout.cell_range(Vec3::new(3.0, 0.0, 0.0), Vec3::splat(0.5)).is_none());
    }
}
