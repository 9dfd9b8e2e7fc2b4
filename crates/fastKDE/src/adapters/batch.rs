//! Batch adapter for one-shot density accumulation.
//!
//! ## Purpose
//!
//! This module provides the batch execution adapter. It accumulates a
//! complete point set into a caller-provided volume, or into a fresh one,
//! in a single parallel pass.
//!
//! ## Design notes
//!
//! * **Processing**: validates, accumulates, and reports a summary.
//! * **Delegation**: all work is delegated to the density engine.
//! * **Parallelism**: defaults to one worker per hardware thread.
//! * **Generics**: generic over `Float` coordinates and integer categories.
//!
//! ## Invariants
//!
//! * The volume shape matches the grid (`[category_count, shape...]`).
//! * A failed call leaves the volume unchanged.
//!
//! ## Non-goals
//!
//! * This adapter does not own the output (use the incremental adapter).

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
// Batch Builder
// ============================================================================

/// Builder for the batch estimator.
#[derive(Debug, Clone, Default)]
pub struct BatchKdeBuilder {
    /// Shared configuration.
    pub base: KdeBuilder,
}

impl BatchKdeBuilder {
    // ========================================================================
    // Shared Setters
    // ========================================================================

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

    // ========================================================================
    // Build Method
    // ========================================================================

    /// Build the batch estimator.
    pub fn build(self) -> Result<BatchKde> {
        let engine = self.base.build_engine(Parallelism::Auto)?;
        Ok(BatchKde { engine })
    }
}

// ============================================================================
// Batch Estimator
// ============================================================================

/// One-shot density estimator.
#[derive(Debug, Clone)]
pub struct BatchKde {
    engine: DensityEngine,
}

impl BatchKde {
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
        self.engine.accumulate(points, volume)
    }

    /// Accumulate `points` into a freshly zeroed volume.
    pub fn estimate<T, K>(&self, points: &PointSet<'_, T, K>) -> Result<DensityVolume>
    where
        T: Float + Send + Sync,
        K: PrimInt + Debug + Send + Sync,
    {
        let mut volume = DensityVolume::zeros(self.engine.grid());
        self.engine.accumulate(points, &mut volume)?;
        Ok(volume)
    }

    /// Sampling grid.
    pub fn grid(&self) -> &Grid {
        self.engine.grid()
    }

    /// Kernel parameters.
    pub fn kernel(&self) -> &KernelSpec {
        self.engine.kernel()
    }

    /// Worker pool, shareable with the evaluation routines.
    pub fn executor(&self) -> &Executor {
        self.engine.executor()
    }

    /// Underlying engine.
    pub fn engine(&self) -> &DensityEngine {
        &self.engine
    }
}
