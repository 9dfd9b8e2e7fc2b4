//! Layer 2: Math
//!
//! ## Purpose
//!
//! This layer provides the numerical building blocks of density
//! accumulation: kernel profiles and truncation, footprint geometry, and the
//! SIMD slice kernels used in the hot loops.
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
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```
//!

/// Clipped per-axis footprints of a point.
pub mod footprint;

/// Kernel families, truncation and normalization.
pub mod kernel;

/// `wide::f64x4` slice kernels.
pub mod simd;
