//! Layer 5: Engine
//!
//! ## Purpose
//!
//! This layer provides the parallel execution engine for density
//! accumulation: the caller-owned worker pool, the two write-partitioning
//! strategies, and the validation that runs before any output is touched.
//!
//! ## Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Engine ← You are here
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Worker pool, accumulation strategies and the density engine.
pub mod executor;

/// Input validation and skip counting.
pub mod validator;
