//! Incremental adapter for accumulation in successive batches.
//!
//! ## Purpose
//!
//! This module provides the incremental execution adapter. It owns a
//! density volume and adds point batches to it as they arrive, which is the
//! natural shape for inputs read chunk by chunk from disk.
//!
//! ## Design notes
//!
//! * **Storage**: one owned volume, allocated at build time.
//! * **Additivity**: adding batches `A` then `B` equals adding `A ∪ B` in
//!   one call, up to floating-point reassociation.
//! * **Parallelism**: defaults to a single worker; set `parallelism` for
//!   large batches.
//!
//! ## Invariants
//!
//! * A rejected batch leaves the volume and the counters unchanged.
//!
//! ## Non-goals
//!
//! * This adapter does not remove points once added.

use std::fmt::Debug;

use num_traits::{Float, PrimInt};

use crate::api::KdeBuilder;
use crate::engine::executor::{AccumulationSummary, DensityEngine, Executor, Parallelism, Strategy};
use crate::input::PointSet;
use crate::math::kernel::KernelSpec;
use crate::primitives::errors::Result;
use crate::primitives::grid::Grid;
use crate::primitives::volume::DensityVolume;

// ============================================================================
// Incremental Builder
// ============================================================================

/// Builder for the incremental estimator.
#[derive(Debug, Clone, Default)]
pub struct IncrementalKdeBuilder {
    /// Shared configuration.
    pub base: KdeBuilder,
}

impl IncrementalKdeBuilder {
    /// Set the sampling grid.
    pub fn grid(mut self, grid: Grid) -> Self {
        self.base.grid = Some(grid);
        self
    }

    /// Set the kernel.
    pub fn kernel(mut self, kernel: KernelSpec) -> Self {
        self.base.kernel = Some(kernel);
        self
    }

    /// Set the worker count.
    pub fn parallelism(mut self, parallelism: Parallelism) -> Self {
        self.base.parallelism = Some(parallelism);
        self
    }

    /// Cap the worker count.
    pub fn max_threads(mut self, max_threads: usize) -> Self {
        self.base.max_threads = Some(max_threads);
        self
    }

    /// Set the write-partitioning strategy.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.base.strategy = strategy;
        self
    }

    /// Override the tile height.
    pub fn tile_rows(mut self, rows: usize) -> Self {
        self.base.tile_rows = Some(rows);
        self
    }

    /// Run on an existing executor.
    pub fn executor(mut self, executor: Executor) -> Self {
        self.base.executor = Some(executor);
        self
    }

    /// Build the incremental estimator with a zeroed volume.
    pub fn build(self) -> Result<IncrementalKde> {
        let engine = self.base.build_engine(Parallelism::Threads(1))?;
        let volume = DensityVolume::zeros(engine.grid());
        Ok(IncrementalKde {
            engine,
            volume,
            points_added: 0,
            skipped: 0,
            batches: 0,
        })
    }
}

// ============================================================================
// Incremental Estimator
// ============================================================================

/// Estimator owning a volume that grows batch by batch.
#[derive(Debug, Clone)]
pub struct IncrementalKde {
    engine: DensityEngine,
    volume: DensityVolume,
    points_added: usize,
    skipped: usize,
    batches: usize,
}

impl IncrementalKde {
    /// Add one batch of points.
    pub fn add_points<T, K>(&mut self, points: &PointSet<'_, T, K>) -> Result<AccumulationSummary>
    where
        T: Float + Send + Sync,
        K: PrimInt + Debug + Send + Sync,
    {
        let summary = self.engine.accumulate(points, &mut self.volume)?;
        self.points_added += summary.points;
        self.skipped += summary.skipped;
        self.batches += 1;
        Ok(summary)
    }

    /// Current volume.
    pub fn volume(&self) -> &DensityVolume {
        &self.volume
    }

    /// Points accepted so far (including skipped ones).
    pub fn points_added(&self) -> usize {
        self.points_added
    }

    /// Points so far whose footprint missed the grid.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Batches accepted so far.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Zero the volume and the counters.
    pub fn reset(&mut self) {
        self.volume.reset();
        self.points_added = 0;
        self.skipped = 0;
        self.batches = 0;
    }

    /// Sampling grid.
    pub fn grid(&self) -> &Grid {
        self.engine.grid()
    }

    /// Worker pool.
    pub fn executor(&self) -> &Executor {
        self.engine.executor()
    }

    /// Consume the estimator and return the volume.
    pub fn finish(self) -> DensityVolume {
        self.volume
    }
}
