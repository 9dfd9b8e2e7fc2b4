//! Layer 3: Algorithms
//!
//! ## Purpose
//!
//! This layer provides the accumulation algorithms proper: adding a single
//! point's footprint into a slab of the output, and partitioning points by
//! the tiles of the grid they touch.
//!
//! ## Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Engine
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Algorithms ← You are here
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Separable per-point accumulation.
pub mod splat;

/// Tile layout and per-tile point index.
pub mod tiling;
