//! Uniform spatial grid for neighbor queries.
//!
//! Space is cut into a regular lattice of cubic buckets; every inserted id is
//! recorded in each bucket its extent overlaps. Queries walk the buckets
//! covered by the query extent and union what they find.
//!
//! The grid is cheap to rebuild, so simulations construct a fresh one every
//! step rather than updating it incrementally.
//!
//! # Example
//!
//! ```
//! use cellgrid::{BucketView, UniformGrid, Vec3};
//!
//! let mut grid = UniformGrid::new(1.0, 4);
//! grid.insert(Vec3::new(0.1, 0.2, 0.3), 0.0, 7);
//! grid.insert(Vec3::new(-0.9, 0.9, 0.0), 0.0, 8);
//!
//! let near = grid.query(Vec3::new(0.1, 0.2, 0.3), 0.1);
//! assert!(near.contains(&7));
//! assert!(!near.contains(&8));
//! ```

use crate::layout::GridLayout;
use crate::packed::PackedGrid;
use glam::{IVec3, UVec3, Vec3};

/// Read access to the buckets of a grid, shared by the live and packed forms.
///
/// Implementors only provide the layout and per-bucket lookup; range
/// queries and ray walks are derived from those.
pub trait BucketView {
    /// Lattice placement and resolution.
    fn layout(&self) -> &GridLayout;

    /// Ids stored in the bucket with flattened index `flat` (empty if unallocated).
    fn bucket(&self, flat: usize) -> &[u32];

    /// Ids stored in the bucket at `cell`.
    fn bucket_at(&self, cell: UVec3) -> &[u32] {
        self.bucket(self.layout().flatten(cell))
    }

    /// Call `f` with the contents of every non-empty bucket overlapped by
    /// `center ± half_extents`. Ids may repeat across calls.
    ///
    /// Nothing is visited when the extent lies outside the domain.
    fn for_each_in_extent<F: FnMut(&[u32])>(&self, center: Vec3, half_extents: Vec3, mut f: F) {
        let layout = self.layout();
        if !layout.admits(center, half_extents) {
            return;
        }
        let Some(range) = layout.cell_range(center, half_extents) else {
            return;
        };
        for cell in range.iter() {
            let ids = self.bucket(layout.flatten(cell));
            if !ids.is_empty() {
                f(ids);
            }
        }
    }

    /// Deduplicated ids of every bucket overlapped by `center ± half_extents`.
    ///
    /// The result is sorted ascending, but callers should treat it as a set.
    fn query_extent(&self, center: Vec3, half_extents: Vec3) -> Vec<u32> {
        let mut out = Vec::new();
        self.for_each_in_extent(center, half_extents, |ids| out.extend_from_slice(ids));
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Deduplicated ids of every bucket within `radius` (per axis) of `position`.
    fn query(&self, position: Vec3, radius: f32) -> Vec<u32> {
        self.query_extent(position, Vec3::splat(radius))
    }

    /// Walk the buckets pierced by the ray `origin + t * dir`, front to back.
    ///
    /// `visit` receives the ids of each non-empty bucket and the ray
    /// parameter at which the ray leaves that bucket, and returns `true` to
    /// keep walking. Hits beyond the exit parameter belong to later buckets.
    fn traverse_ray<F>(&self, origin: Vec3, dir: Vec3, mut visit: F)
    where
        F: FnMut(&[u32], f32) -> bool,
    {
        let layout = *self.layout();
        if dir == Vec3::ZERO {
            return;
        }
        let lo = layout.min;
        let hi = layout.lattice_max();

        // Slab test against the lattice box.
        let mut t_enter = 0.0f32;
        let mut t_leave = f32::INFINITY;
        for axis in 0..3 {
            if dir[axis] == 0.0 {
                if origin[axis] < lo[axis] || origin[axis] > hi[axis] {
                    return;
                }
            } else {
                let a = (lo[axis] - origin[axis]) / dir[axis];
                let b = (hi[axis] - origin[axis]) / dir[axis];
                t_enter = t_enter.max(a.min(b));
                t_leave = t_leave.min(a.max(b));
            }
        }
        if t_enter > t_leave {
            return;
        }

        let last = layout.bin_count.as_ivec3() - IVec3::ONE;
        let entry = origin + dir * t_enter;
        let mut cell = ((entry - lo) / layout.bin_size)
            .floor()
            .as_ivec3()
            .clamp(IVec3::ZERO, last);

        let mut step = IVec3::ZERO;
        let mut t_next = Vec3::splat(f32::INFINITY);
        let mut t_delta = Vec3::splat(f32::INFINITY);
        for axis in 0..3 {
            let (cell_lo, cell_hi) = layout.cell_bounds(cell.as_uvec3());
            if dir[axis] > 0.0 {
                step[axis] = 1;
                t_next[axis] = (cell_hi[axis] - origin[axis]) / dir[axis];
                t_delta[axis] = layout.bin_size / dir[axis];
            } else if dir[axis] < 0.0 {
                step[axis] = -1;
                t_next[axis] = (cell_lo[axis] - origin[axis]) / dir[axis];
                t_delta[axis] = -layout.bin_size / dir[axis];
            }
        }

        loop {
            let exit = t_next.min_element().min(t_leave);
            let ids = self.bucket(layout.flatten(cell.as_uvec3()));
            if !ids.is_empty() && !visit(ids, exit) {
                return;
            }

            let axis = if t_next.x < t_next.y {
                if t_next.x < t_next.z {
                    0
                } else {
                    2
                }
            } else if t_next.y < t_next.z {
                1
            } else {
                2
            };
            if !t_next[axis].is_finite() || t_next[axis] > t_leave {
                return;
            }
            cell[axis] += step[axis];
            if cell[axis] < 0 || cell[axis] > last[axis] {
                return;
            }
            t_next[axis] += t_delta[axis];
        }
    }
}

/// Uniform grid of buckets holding opaque `u32` ids.
///
/// Buckets are allocated lazily: `slots` maps every lattice cell to an
/// optional index into `bins`, and only cells that received an id own a
/// bucket.
#[derive(Clone, Debug)]
pub struct UniformGrid {
    layout: GridLayout,
    /// Allocated bucket contents, in allocation order.
    bins: Vec<Vec<u32>>,
    /// Flattened cell -> index into `bins`.
    slots: Vec<Option<u32>>,
}

impl UniformGrid {
    /// Grid over the cube `[-size, size]³` with `bin_count` buckets per axis.
    pub fn new(size: f32, bin_count: u32) -> Self {
        Self::from_layout(GridLayout::centered(size, bin_count))
    }

    /// Grid over the box `[min, max]` with cubic buckets of `cell_size`.
    pub fn with_bounds(min: Vec3, max: Vec3, cell_size: f32) -> Self {
        Self::from_layout(GridLayout::bounded(min, max, cell_size))
    }

    /// Empty grid with an explicit layout.
    ///
    /// # Panics
    ///
    /// Panics if the layout has no buckets on some axis or a non-positive bin size.
    pub fn from_layout(layout: GridLayout) -> Self {
        assert!(
            layout.bin_count.min_element() > 0 && layout.bin_size > 0.0,
            "degenerate grid layout: {} bins of size {}",
            layout.bin_count,
            layout.bin_size,
        );
        Self {
            layout,
            bins: Vec::new(),
            slots: vec![None; layout.bucket_count()],
        }
    }

    /// Record `id` in every bucket overlapped by `position ± radius`.
    ///
    /// # Panics
    ///
    /// Panics if `position` is further than `radius` outside the domain on
    /// any axis. Buckets of a straddling extent that fall off the lattice are
    /// skipped.
    pub fn insert(&mut self, position: Vec3, radius: f32, id: u32) {
        self.insert_extent(position, Vec3::splat(radius), id);
    }

    /// Record `id` in every bucket overlapped by the box `center ± half_extents`.
    ///
    /// # Panics
    ///
    /// Same contract as [`insert`](Self::insert).
    pub fn insert_extent(&mut self, center: Vec3, half_extents: Vec3, id: u32) {
        assert!(
            self.layout.admits(center, half_extents),
            "grid insert out of domain: {center} ± {half_extents} not within [{}, {}]",
            self.layout.min,
            self.layout.max,
        );
        let Some(range) = self.layout.cell_range(center, half_extents) else {
            return;
        };
        for cell in range.iter() {
            let flat = self.layout.flatten(cell);
            let bin = match self.slots[flat] {
                Some(bin) => bin as usize,
                None => {
                    self.bins.push(Vec::new());
                    let bin = self.bins.len() - 1;
                    self.slots[flat] = Some(bin as u32);
                    bin
                }
            };
            self.bins[bin].push(id);
        }
    }

    /// Number of buckets that hold at least one id.
    pub fn occupied_buckets(&self) -> usize {
        self.bins.len()
    }

    /// Whether nothing has been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Flatten into a [`PackedGrid`] for bulk scanning.
    pub fn pack(&self) -> PackedGrid {
        PackedGrid::from_grid(self)
    }
}

impl BucketView for UniformGrid {
    #[inline]
    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    #[inline]
    fn bucket(&self, flat: usize) -> &[u32] {
        match self.slots[flat] {
            Some(bin) => &self.bins[bin as usize],
            None => &[],
        }
    }
}
