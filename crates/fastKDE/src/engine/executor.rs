//! Parallel execution engine for density accumulation.
//!
//! ## Purpose
//!
//! This module owns the worker pool and implements the two accumulation
//! strategies. It enables multi-threaded accumulation of millions of points
//! into a shared density volume without locks or atomics.
//!
//! ## Design notes
//!
//! * **Explicit context**: an [`Executor`] wraps a caller-owned
//!   `rayon::ThreadPool`; nothing runs on the global pool.
//! * **Tiled strategy**: the volume is split into disjoint
//!   `(category, tile)` slabs with `chunks_mut`; each slab is owned by one
//!   worker and receives its points in input order. The result is
//!   bit-identical for every thread count.
//! * **Private-volume strategy**: points are split into one contiguous chunk
//!   per worker, each accumulated into a private volume, then summed. The
//!   result matches the tiled one up to floating-point reassociation.
//! * **Buffer reuse**: one footprint buffer per worker, created with rayon's
//!   `*_init` combinators.
//!
//! ## Key concepts
//!
//! * **Reference result**: `Parallelism::Threads(1)` with the tiled strategy.
//! * **Summary**: every call reports processed and skipped point counts.
//!
//! ## Invariants
//!
//! * Validation finishes before the first write; a failed call leaves the
//!   volume unchanged.
//! * Tile layout never depends on the worker count.
//!
//! ## Non-goals
//!
//! * This module does not allocate the caller's volume.

use std::fmt::Debug;
use std::num::NonZeroUsize;
use std::sync::Arc;

use num_traits::{Float, PrimInt};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, trace};

use crate::algorithms::splat::splat_point;
use crate::algorithms::tiling::{TileIndex, TileLayout};
use crate::engine::validator::Validator;
use crate::input::PointSet;
use crate::math::footprint::fill;
use crate::math::kernel::{KernelSpec, ResolvedKernel};
use crate::math::simd::add_assign;
use crate::primitives::buffer::FootprintBuffer;
use crate::primitives::errors::{KdeError, Result};
use crate::primitives::grid::Grid;
use crate::primitives::volume::DensityVolume;

// ============================================================================
// Configuration Enums
// ============================================================================

/// Number of workers to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parallelism {
    /// One worker per available hardware thread.
    #[default]
    Auto,
    /// Exactly this many workers (at least 1).
    Threads(usize),
}

/// How concurrent writes to the volume are organised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Disjoint `(category, tile)` slabs; deterministic for any thread count.
    #[default]
    Tiled,
    /// Per-worker private volumes merged by summation.
    PrivateVolumes,
}

// ============================================================================
// Executor
// ============================================================================

/// Caller-owned worker pool.
#[derive(Debug, Clone)]
pub struct Executor {
    pool: Arc<ThreadPool>,
    threads: usize,
}

impl Executor {
    /// Build a pool for `parallelism`, capped at `max_threads` when given.
    pub fn new(parallelism: Parallelism, max_threads: Option<usize>) -> Result<Self> {
        let requested = match parallelism {
            Parallelism::Auto => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            Parallelism::Threads(0) => {
                return Err(KdeError::config("thread count must be at least 1"));
            }
            Parallelism::Threads(n) => n,
        };
        if max_threads == Some(0) {
            return Err(KdeError::config("max_threads must be at least 1"));
        }
        let threads = max_threads.map_or(requested, |cap| requested.min(cap));

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fastkde-worker-{i}"))
            .build()
            .map_err(|e| KdeError::config(format!("failed to build thread pool: {e}")))?;

        debug!(threads, ?parallelism, "executor ready");
        Ok(Self {
            pool: Arc::new(pool),
            threads,
        })
    }

    /// Single-worker executor producing the reference result.
    pub fn sequential() -> Result<Self> {
        Self::new(Parallelism::Threads(1), None)
    }

    /// Number of workers.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `op` inside the pool.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

// ============================================================================
// Accumulation Passes
// ============================================================================

/// Outcome of one accumulation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulationSummary {
    /// Points in the input.
    pub points: usize,
    /// Points whose footprint missed the grid.
    pub skipped: usize,
    /// Workers used.
    pub threads: usize,
    /// Strategy used.
    pub strategy: Strategy,
}

/// Accumulate validated points into disjoint tiles of `cells`.
pub fn tiled_pass<T, K>(
    points: &PointSet<'_, T, K>,
    grid: &Grid,
    kernel: &ResolvedKernel,
    layout: &TileLayout,
    cells: &mut [f64],
) where
    T: Float + Sync,
    K: PrimInt + Debug + Sync,
{
    let index = TileIndex::build(points, grid, kernel, layout);
    trace!(
        tiles = layout.tile_count(),
        rows_per_tile = layout.rows_per_tile(),
        entries = index.entry_count(),
        occupied = index.occupied_buckets(),
        "tile index built"
    );

    let dims = grid.dims();
    let slab_len = layout.rows_per_tile() * grid.strides()[0];
    let units: Vec<(usize, usize, &mut [f64])> = cells
        .chunks_mut(grid.spatial_len())
        .enumerate()
        .flat_map(|(category, channel)| {
            channel
                .chunks_mut(slab_len)
                .enumerate()
                .map(move |(tile, slab)| (category, tile, slab))
        })
        .collect();

    units.into_par_iter().for_each_init(
        || FootprintBuffer::new(dims),
        |buf, (category, tile, slab)| {
            let rows = layout.rows(tile);
            for &i in index.bucket(category, tile) {
                points.fractional_into(i, grid, &mut buf.coords);
                if fill(buf, kernel, grid.shape(), rows.clone()) {
                    splat_point(buf, points.weight(i), grid.strides(), rows.start, slab);
                }
            }
        },
    );
}

/// Accumulate validated points through `workers` private volumes.
pub fn private_pass<T, K>(
    points: &PointSet<'_, T, K>,
    grid: &Grid,
    kernel: &ResolvedKernel,
    workers: usize,
    cells: &mut [f64],
) where
    T: Float + Sync,
    K: PrimInt + Debug + Sync,
{
    let n = points.len();
    if n == 0 {
        return;
    }
    let dims = grid.dims();
    let spatial = grid.spatial_len();
    let len = cells.len();
    let shape = grid.shape();
    let chunk = n.div_ceil(workers.max(1));

    let merged = (0..n.div_ceil(chunk))
        .into_par_iter()
        .map(|c| {
            let mut local = vec![0.0; len];
            let mut buf = FootprintBuffer::new(dims);
            for i in c * chunk..((c + 1) * chunk).min(n) {
                let Some(category) = points.category(i) else {
                    continue;
                };
                points.fractional_into(i, grid, &mut buf.coords);
                if fill(&mut buf, kernel, shape, 0..shape[0]) {
                    let channel = &mut local[category * spatial..(category + 1) * spatial];
                    splat_point(&mut buf, points.weight(i), grid.strides(), 0, channel);
                }
            }
            local
        })
        .reduce_with(|mut a, b| {
            add_assign(&mut a, &b);
            a
        });

    if let Some(partial) = merged {
        add_assign(cells, &partial);
    }
}

// ============================================================================
// Density Engine
// ============================================================================

/// Validated accumulation context shared by the adapters.
#[derive(Debug, Clone)]
pub struct DensityEngine {
    grid: Grid,
    spec: KernelSpec,
    kernel: ResolvedKernel,
    layout: TileLayout,
    executor: Executor,
    strategy: Strategy,
}

impl DensityEngine {
    /// Bind a kernel to a grid and an executor.
    pub fn new(
        grid: Grid,
        spec: KernelSpec,
        executor: Executor,
        strategy: Strategy,
        tile_rows: Option<usize>,
    ) -> Result<Self> {
        if tile_rows == Some(0) {
            return Err(KdeError::config("tile_rows must be at least 1"));
        }
        let kernel = spec.resolve(&grid)?;
        let layout = TileLayout::for_grid(&grid, &kernel, tile_rows);
        debug!(
            dims = grid.dims(),
            categories = grid.category_count(),
            cells = grid.spatial_len(),
            tail_mass = kernel.tail_mass(),
            tiles = layout.tile_count(),
            "density engine ready"
        );
        Ok(Self {
            grid,
            spec,
            kernel,
            layout,
            executor,
            strategy,
        })
    }

    /// Sampling grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Kernel parameters.
    pub fn kernel(&self) -> &KernelSpec {
        &self.spec
    }

    /// Kernel bound to the grid.
    pub fn resolved_kernel(&self) -> &ResolvedKernel {
        &self.kernel
    }

    /// Worker pool.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Write-partitioning strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Tile partition used by the tiled strategy.
    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    /// Add the contributions of `points` to `volume`.
    pub fn accumulate<T, K>(
        &self,
        points: &PointSet<'_, T, K>,
        volume: &mut DensityVolume,
    ) -> Result<AccumulationSummary>
    where
        T: Float + Send + Sync,
        K: PrimInt + Debug + Send + Sync,
    {
        let _span = debug_span!(
            "accumulate",
            points = points.len(),
            strategy = ?self.strategy,
            threads = self.executor.threads()
        )
        .entered();

        volume.check_grid(&self.grid)?;
        let cells = volume.cells_mut()?;

        let (grid, kernel, layout) = (&self.grid, &self.kernel, &self.layout);
        let strategy = self.strategy;
        let workers = self.executor.threads();
        let skipped = self.executor.install(|| -> Result<usize> {
            Validator::validate_points(points, grid)?;
            let skipped = Validator::count_outside(points, grid, kernel);
            match strategy {
                Strategy::Tiled => tiled_pass(points, grid, kernel, layout, cells),
                Strategy::PrivateVolumes => private_pass(points, grid, kernel, workers, cells),
            }
            Ok(skipped)
        })?;

        let summary = AccumulationSummary {
            points: points.len(),
            skipped,
            threads: workers,
            strategy,
        };
        debug!(
            points = summary.points,
            skipped = summary.skipped,
            "accumulation finished"
        );
        Ok(summary)
    }
}
