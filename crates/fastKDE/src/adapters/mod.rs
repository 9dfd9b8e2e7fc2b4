//! Layer 6: Adapters
//!
//! ## Purpose
//!
//! This layer provides the execution adapters that turn a configured
//! density engine into a user-facing estimator: one-shot accumulation and
//! incremental accumulation into an owned volume.
//!
//! ## Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters ← You are here
//!   ↓
//! Layer 5: Engine
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// One-shot accumulation.
pub mod batch;

/// Accumulation in successive batches.
pub mod incremental;
