//! High-level API for density accumulation.
//!
//! ## Purpose
//!
//! This module provides the primary user-facing entry point. It implements
//! a fluent builder for configuring the grid, kernel, and parallel
//! execution, and for choosing an execution adapter (Batch or Incremental).
//!
//! ## Design notes
//!
//! * **Ergonomic**: fluent builder with sensible defaults for everything but
//!   the grid and kernel.
//! * **Polymorphic**: marker types convert the shared builder into
//!   adapter-specific builders.
//! * **Validated**: the grid/kernel pairing, thread pool, and tile layout are
//!   checked when `.build()` is called on the adapter builder.
//!
//! ## Key concepts
//!
//! * **Execution Adapters**: `Batch` for one-shot accumulation into a
//!   caller-provided or fresh volume, `Incremental` for an owned volume that
//!   grows batch by batch.
//! * **Configuration Flow**: builder pattern ending in `.adapter(Adapter::Type)`.
//!
//! ### Configuration Flow
//!
//! 1. Create a [`KdeBuilder`] via `Kde::new()`.
//! 2. Chain configuration methods (`.grid()`, `.kernel()`, `.parallelism()`, ...).
//! 3. Select an adapter via `.adapter(Adapter::Batch)` and call `.build()`.

use crate::adapters::batch::BatchKdeBuilder;
use crate::adapters::incremental::IncrementalKdeBuilder;
use crate::engine::executor::{DensityEngine, Executor};
use crate::primitives::errors::{KdeError, Result};

// Publicly re-exported types
pub use crate::engine::executor::{AccumulationSummary, Parallelism, Strategy};
pub use crate::evaluation::flood::FloodFillParams;
pub use crate::input::{KdeInput, PointSet};
pub use crate::math::kernel::{KernelFamily, KernelSpec, Normalization, Truncation};
pub use crate::primitives::grid::Grid;
pub use crate::primitives::volume::{DensityVolume, SparseDensity, VectorField};

// ============================================================================
// Shared Builder
// ============================================================================

/// Entry point for building an estimator.
#[derive(Debug, Clone, Copy)]
pub struct Kde;

impl Kde {
    /// Start a new builder with default settings.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> KdeBuilder {
        KdeBuilder::default()
    }
}

/// Adapter-independent estimator configuration.
#[derive(Debug, Clone, Default)]
pub struct KdeBuilder {
    /// Sampling grid (required).
    pub grid: Option<Grid>,
    /// Kernel parameters (required).
    pub kernel: Option<KernelSpec>,
    /// Worker count; the adapter picks a default when unset.
    pub parallelism: Option<Parallelism>,
    /// Upper bound on the worker count.
    pub max_threads: Option<usize>,
    /// Write-partitioning strategy.
    pub strategy: Strategy,
    /// Tile height override for the tiled strategy.
    pub tile_rows: Option<usize>,
    /// Existing executor to share instead of building a new pool.
    pub executor: Option<Executor>,
}

impl KdeBuilder {
    /// Set the sampling grid.
    pub fn grid(mut self, grid: Grid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Set the kernel.
    pub fn kernel(mut self, kernel: KernelSpec) -> Self {
        self.kernel = Some(kernel);
        self
    }

    /// Set the worker count.
    pub fn parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    /// Cap the worker count.
    pub fn max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = Some(max_threads);
        self
    }

    /// Set the write-partitioning strategy.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Override the tile height (rows of axis 0 per tile).
    pub fn tile_rows(mut self, rows: usize) -> Self {
        self.tile_rows = Some(rows);
        self
    }

    /// Run on an existing executor.
    pub fn executor(mut self, executor: Executor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Convert into an adapter-specific builder.
    pub fn adapter<A: KdeAdapter>(self, _adapter: A) -> A::Output {
        A::convert(self)
    }

    /// Validate the configuration and create the engine.
    pub(crate) fn build_engine(self, default_parallelism: Parallelism) -> Result<DensityEngine> {
        let grid = self
            .grid
            .ok_or_else(|| KdeError::config("a grid is required"))?;
        let kernel = self
            .kernel
            .ok_or_else(|| KdeError::config("a kernel is required"))?;
        let executor = match self.executor {
            Some(executor) => executor,
            None => Executor::new(
                self.parallelism.unwrap_or(default_parallelism),
                self.max_threads,
            )?,
        };
        DensityEngine::new(grid, kernel, executor, self.strategy, self.tile_rows)
    }
}

/// Conversion from the shared builder into an adapter builder.
pub trait KdeAdapter {
    /// Adapter-specific builder.
    type Output;

    /// Wrap the shared configuration.
    fn convert(builder: KdeBuilder) -> Self::Output;
}

// ============================================================================
// Adapter Module
// ============================================================================

/// Adapter selection namespace.
#[allow(non_snake_case)]
pub mod Adapter {
    pub use super::{Batch, Incremental};
}

// ============================================================================
// Adapter Marker Types
// ============================================================================

/// Marker for one-shot parallel accumulation.
#[derive(Debug, Clone, Copy)]
pub struct Batch;

impl KdeAdapter for Batch {
    type Output = BatchKdeBuilder;

    fn convert(builder: KdeBuilder) -> Self::Output {
        BatchKdeBuilder { base: builder }
    }
}

/// Marker for accumulation into an owned, growing volume.
#[derive(Debug, Clone, Copy)]
pub struct Incremental;

impl KdeAdapter for Incremental {
    type Output = IncrementalKdeBuilder;

    fn convert(builder: KdeBuilder) -> Self::Output {
        IncrementalKdeBuilder { base: builder }
    }
}
