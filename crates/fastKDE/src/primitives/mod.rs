//! Layer 1: Primitives
//!
//! ## Purpose
//!
//! This layer provides the data types every other layer builds on: the error
//! enum, the sampling grid, the output containers, and scratch buffers.
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
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives ← You are here
//! ```

/// Reusable per-worker scratch space.
pub mod buffer;

/// Error type and result alias.
pub mod errors;

/// Sampling lattice definition.
pub mod grid;

/// Density volumes, sparse export and vector fields.
pub mod volume;
