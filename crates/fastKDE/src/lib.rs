//! # fastKDE
//!
//! Multi-threaded, SIMD-accelerated kernel density accumulation of
//! categorized 2D/3D points onto dense grids.
//!
//! Every point carries a category and an optional weight. Its contribution
//! is a separable kernel (Gaussian by default) evaluated on the grid nodes
//! inside a truncated footprint and added to the channel of its category.
//! The resulting `[category_count, shape...]` volume can be read as a
//! per-location vector field and analysed with Pearson-based signature
//! routines (cell-type maps, local correlation maps, flood fill).
//!
//! ## Quick start
//!
//! ```rust
//! use fastKDE::prelude::*;
//!
//! # fn main() -> Result<(), KdeError> {
//! let grid = Grid::unit(vec![32, 32], 2)?;
//! let kde = Kde::new()
//!     .grid(grid)
//!     .kernel(KernelSpec::gaussian(vec![1.5], Truncation::default())?)
//!     .adapter(Batch)
//!     .build()?;
//!
//! let coords = vec![10.0, 12.0, 20.5, 3.25];
//! let categories = vec![0u32, 1];
//! let points = PointSet::new(&coords, 2, &categories)?;
//!
//! let volume = kde.estimate(&points)?;
//! assert_eq!(volume.shape(), &[2, 32, 32]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Parallelism
//!
//! Work runs on a caller-owned rayon pool ([`Executor`](engine::executor::Executor)).
//! The default `Tiled` strategy gives every worker a disjoint band of grid
//! rows and replays the points of that band in input order, so results are
//! bit-identical for any thread count. `PrivateVolumes` trades that for
//! lock-free per-worker accumulators reduced at the end.
//!
//! ## Architecture
//!
//! ```text
//! Layer 7: API          api
//! Layer 6: Adapters     adapters::{batch, incremental}
//! Layer 5: Engine       engine::{executor, validator}
//! Layer 4: Evaluation   evaluation::{correlation, celltype, corrmap, flood}
//! Layer 3: Algorithms   algorithms::{splat, tiling}
//! Layer 2: Math         math::{kernel, footprint, simd}
//! Layer 1: Primitives   primitives::{errors, grid, volume, buffer}
//! ```

#![allow(non_snake_case)]

// Layer 1: Primitives - errors, grid geometry, volumes, scratch buffers.
mod primitives;

// Layer 2: Math - kernel families, footprints, SIMD helpers.
mod math;

// Layer 3: Algorithms - point splatting and tile partitioning.
mod algorithms;

// Layer 4: Evaluation - signature analysis over vector fields.
mod evaluation;

// Layer 5: Engine - worker pool and accumulation strategies.
mod engine;

// Layer 6: Adapters - batch and incremental estimators.
mod adapters;

// Layer 7: API - fluent builder and public re-exports.
mod api;

// Input abstractions.
mod input;

/// Standard fastKDE prelude.
pub mod prelude {
    pub use crate::api::{
        AccumulationSummary, Adapter, Batch, DensityVolume, FloodFillParams, Grid, Incremental,
        Kde, KdeAdapter, KdeBuilder, KdeInput, KernelFamily, KernelSpec, Normalization,
        Parallelism, PointSet, SparseDensity, Strategy, Truncation, VectorField,
    };
    pub use crate::adapters::batch::{BatchKde, BatchKdeBuilder};
    pub use crate::adapters::incremental::{IncrementalKde, IncrementalKdeBuilder};
    pub use crate::engine::executor::Executor;
    pub use crate::evaluation::celltype::cell_type_map;
    pub use crate::evaluation::correlation::pearson;
    pub use crate::evaluation::corrmap::{
        local_correlation_map, neighbor_correlations, neighborhood_size,
    };
    pub use crate::evaluation::flood::flood_fill;
    pub use crate::primitives::errors::KdeError;
}

/// Internal modules for advanced use and testing.
#[doc(hidden)]
pub mod internals {
    /// Layer 1.
    pub mod primitives {
        pub use crate::primitives::*;
    }
    /// Layer 2.
    pub mod math {
        pub use crate::math::*;
    }
    /// Layer 3.
    pub mod algorithms {
        pub use crate::algorithms::*;
    }
    /// Layer 4.
    pub mod evaluation {
        pub use crate::evaluation::*;
    }
    /// Layer 5.
    pub mod engine {
        pub use crate::engine::*;
    }
    /// Layer 6.
    pub mod adapters {
        pub use crate::adapters::*;
    }
    /// Layer 7.
    pub mod api {
        pub use crate::api::*;
    }
}
