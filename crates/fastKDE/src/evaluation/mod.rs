//! Layer 4: Evaluation
//!
//! ## Purpose
//!
//! This layer provides signature analysis over accumulated densities viewed
//! as vector fields: Pearson correlation, cell-type maps, local correlation
//! maps, and correlation-driven flood fill.
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
//! Layer 4: Evaluation ← You are here
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Cell-type maps against a centroid signature.
pub mod celltype;

/// Pearson correlation coefficient.
pub mod correlation;

/// Neighbourhood correlation maps.
pub mod corrmap;

/// Correlation-driven region growing.
pub mod flood;
