//! Flattened, read-only grid for bulk and parallel scanning.
//!
//! A [`PackedGrid`] stores every bucket as an `(offset, count)` entry into a
//! single concatenated id buffer. There is no per-bucket allocation and no
//! pointer chasing, so the two buffers can be handed as-is to worker threads,
//! a vectorized kernel, or a GPU storage buffer.
//!
//! ```text
//! arena_table: [ (0,0) (1,2) (0,0) (3,1) ... ]   one entry per bucket slot
//!                        │          │
//! ids:         [ 0 | 4 7 | 9 | ... ]             leading 0 is never referenced
//! ```

use crate::layout::GridLayout;
use crate::spatial::{BucketView, UniformGrid};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rayon::prelude::*;

/// Location of one bucket inside [`PackedGrid::ids`].
///
/// `(0, 0)` marks an empty bucket. Non-empty buckets always have
/// `offset >= 1`, so an empty entry can never alias real data.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ArenaEntry {
    pub offset: u32,
    pub count: u32,
}

impl ArenaEntry {
    pub const EMPTY: Self = Self { offset: 0, count: 0 };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    fn range(&self) -> std::ops::Range<usize> {
        self.offset as usize..(self.offset + self.count) as usize
    }
}

/// Fixed-size description of a packed grid for external consumers.
///
/// Laid out for direct upload next to [`PackedGrid::arena_bytes`] and
/// [`PackedGrid::id_bytes`] (16-byte aligned rows).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PackedGridHeader {
    pub min: [f32; 3],
    pub bin_size: f32,
    pub max: [f32; 3],
    pub bucket_count: u32,
    pub bin_count: [u32; 3],
    pub id_count: u32,
}

/// Immutable flat export of a [`UniformGrid`].
#[derive(Clone, Debug)]
pub struct PackedGrid {
    layout: GridLayout,
    arena_table: Vec<ArenaEntry>,
    ids: Vec<u32>,
}

impl PackedGrid {
    /// Pack every bucket of `grid` in ascending flattened order.
    ///
    /// Ids keep the order they have inside each source bucket. An empty grid
    /// packs to an all-empty table and `ids == [0]`.
    pub fn from_grid(grid: &UniformGrid) -> Self {
        let layout = *grid.layout();
        let bucket_count = layout.bucket_count();
        let mut arena_table = Vec::with_capacity(bucket_count);
        let mut ids = vec![0u32];

        for flat in 0..bucket_count {
            let bucket = grid.bucket(flat);
            if bucket.is_empty() {
                arena_table.push(ArenaEntry::EMPTY);
            } else {
                arena_table.push(ArenaEntry {
                    offset: ids.len() as u32,
                    count: bucket.len() as u32,
                });
                ids.extend_from_slice(bucket);
            }
        }

        Self {
            layout,
            arena_table,
            ids,
        }
    }

    /// One entry per bucket slot, in flattened order.
    pub fn arena_table(&self) -> &[ArenaEntry] {
        &self.arena_table
    }

    /// Concatenated ids of all buckets, preceded by a single `0`.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Table entry for the bucket with flattened index `flat`.
    pub fn entry(&self, flat: usize) -> ArenaEntry {
        self.arena_table[flat]
    }

    /// Non-empty buckets as `(flat_index, ids)`, in flattened order.
    pub fn buckets(&self) -> impl Iterator<Item = (usize, &[u32])> + '_ {
        self.arena_table
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_empty())
            .map(move |(flat, e)| (flat, &self.ids[e.range()]))
    }

    /// POD header describing the layout and buffer sizes.
    pub fn header(&self) -> PackedGridHeader {
        PackedGridHeader {
            min: self.layout.min.to_array(),
            bin_size: self.layout.bin_size,
            max: self.layout.max.to_array(),
            bucket_count: self.arena_table.len() as u32,
            bin_count: self.layout.bin_count.to_array(),
            id_count: self.ids.len() as u32,
        }
    }

    /// Raw bytes of the arena table (`offset, count` pairs as `u32`).
    pub fn arena_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.arena_table)
    }

    /// Raw bytes of the id buffer.
    pub fn id_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.ids)
    }

    /// Answer many `(position, radius)` queries in parallel.
    ///
    /// Each result has the same contents as [`BucketView::query`] for that
    /// query; results come back in input order.
    pub fn query_batch(&self, queries: &[(Vec3, f32)]) -> Vec<Vec<u32>> {
        queries
            .par_iter()
            .map(|&(position, radius)| self.query(position, radius))
            .collect()
    }
}

impl BucketView for PackedGrid {
    #[inline]
    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    #[inline]
    fn bucket(&self, flat: usize) -> &[u32] {
        &self.ids[self.arena_table[flat].range()]
    }
}

impl From<&UniformGrid> for PackedGrid {
    fn from(grid: &UniformGrid) -> Self {
        Self::from_grid(grid)
    }
}
