//! Spatial partitioning for lock-free parallel accumulation.
//!
//! ## Purpose
//!
//! This module splits the grid into tiles of whole rows along axis 0 and
//! builds a compressed index listing, for every `(category, tile)` pair, the
//! points whose footprint overlaps that tile.
//!
//! ## Design notes
//!
//! * **Thread-independent layout**: the tile height depends only on the grid
//!   extent and the kernel radius, never on the worker count.
//! * **Halo-sized tiles**: a tile is at least one footprint tall, so a point
//!   appears in at most two or three tiles.
//! * **Input order**: bucket entries are stored in ascending point index, so
//!   every cell receives its contributions in input order.
//! * **CSR storage**: one offsets array and one flat entry array; no
//!   per-bucket allocation.
//!
//! ## Invariants
//!
//! * Tiles are disjoint and cover `[0, shape[0])`.
//! * A point is listed in a bucket iff its category matches and its clipped
//!   footprint intersects the tile.

use std::fmt::Debug;
use std::ops::Range;

use num_traits::{Float, PrimInt};
use rayon::prelude::*;

use crate::input::PointSet;
use crate::math::footprint::{axis_span, overlaps};
use crate::math::kernel::ResolvedKernel;
use crate::primitives::grid::Grid;

/// Upper bound on the number of tiles along axis 0 for the default layout.
pub const TARGET_TILES: usize = 256;

// ============================================================================
// Tile Layout
// ============================================================================

/// Row partition of axis 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    rows_per_tile: usize,
    tile_count: usize,
    extent: usize,
}

impl TileLayout {
    /// Partition `extent` rows. `rows_per_tile` overrides the default height.
    pub fn new(extent: usize, radius: f64, rows_per_tile: Option<usize>) -> Self {
        let extent = extent.max(1);
        let rows = rows_per_tile
            .unwrap_or_else(|| {
                let halo = (2.0 * radius).ceil().min(extent as f64) as usize + 1;
                halo.max(extent.div_ceil(TARGET_TILES))
            })
            .clamp(1, extent);
        Self {
            rows_per_tile: rows,
            tile_count: extent.div_ceil(rows),
            extent,
        }
    }

    /// Default layout for a grid and kernel.
    pub fn for_grid(grid: &Grid, kernel: &ResolvedKernel, rows_per_tile: Option<usize>) -> Self {
        Self::new(grid.shape()[0], kernel.radius(0), rows_per_tile)
    }

    /// Rows per tile (the last tile may be shorter).
    pub fn rows_per_tile(&self) -> usize {
        self.rows_per_tile
    }

    /// Number of tiles.
    pub fn tile_count(&self) -> usize {
        self.tile_count
    }

    /// Rows covered by `tile`.
    #[inline]
    pub fn rows(&self, tile: usize) -> Range<usize> {
        let start = tile * self.rows_per_tile;
        start..(start + self.rows_per_tile).min(self.extent)
    }

    /// Tiles intersecting a non-empty row range.
    #[inline]
    pub fn tiles_for(&self, rows: Range<usize>) -> Range<usize> {
        rows.start / self.rows_per_tile..(rows.end - 1) / self.rows_per_tile + 1
    }
}

// ============================================================================
// Tile Index
// ============================================================================

/// Per-`(category, tile)` point lists in CSR form.
#[derive(Debug, Clone)]
pub struct TileIndex {
    tile_count: usize,
    offsets: Vec<usize>,
    entries: Vec<usize>,
}

impl TileIndex {
    /// Bucket every point of `points` by category and overlapped tiles.
    ///
    /// Points must already be validated. Runs on the current rayon pool.
    pub fn build<T, K>(
        points: &PointSet<'_, T, K>,
        grid: &Grid,
        kernel: &ResolvedKernel,
        layout: &TileLayout,
    ) -> Self
    where
        T: Float + Sync,
        K: PrimInt + Debug + Sync,
    {
        let tile_count = layout.tile_count();
        let bucket_count = grid.category_count() * tile_count;
        let dims = grid.dims();

        let located: Vec<Option<(usize, Range<usize>)>> = (0..points.len())
            .into_par_iter()
            .map_init(
                || vec![0.0; dims],
                |u, i| {
                    let category = points.category(i)?;
                    points.fractional_into(i, grid, u);
                    if !overlaps(u, kernel, grid.shape()) {
                        return None;
                    }
                    let span = axis_span(u[0], kernel.radius(0), grid.shape()[0])?;
                    Some((category, layout.tiles_for(span)))
                },
            )
            .collect();

        let mut offsets = vec![0usize; bucket_count + 1];
        for (category, tiles) in located.iter().flatten() {
            for tile in tiles.clone() {
                offsets[category * tile_count + tile + 1] += 1;
            }
        }
        for b in 0..bucket_count {
            offsets[b + 1] += offsets[b];
        }

        let mut fill = offsets[..bucket_count].to_vec();
        let mut entries = vec![0usize; offsets[bucket_count]];
        for (i, (category, tiles)) in located
            .into_iter()
            .enumerate()
            .filter_map(|(i, loc)| loc.map(|l| (i, l)))
        {
            for tile in tiles {
                let slot = &mut fill[category * tile_count + tile];
                entries[*slot] = i;
                *slot += 1;
            }
        }

        Self {
            tile_count,
            offsets,
            entries,
        }
    }

    /// Points of `category` overlapping `tile`, in input order.
    #[inline]
    pub fn bucket(&self, category: usize, tile: usize) -> &[usize] {
        let b = category * self.tile_count + tile;
        &self.entries[self.offsets[b]..self.offsets[b + 1]]
    }

    /// Total number of `(point, tile)` entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of non-empty buckets.
    pub fn occupied_buckets(&self) -> usize {
        self.offsets.windows(2).filter(|w| w[1] > w[0]).count()
    }
}
