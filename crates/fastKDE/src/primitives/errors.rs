//! Error types for density accumulation and signature analysis.
//!
//! ## Purpose
//!
//! This module defines the single error enum returned by every fallible
//! operation in the crate.
//!
//! ## Key concepts
//!
//! * **Configuration errors** are raised while building a grid, kernel, or
//!   estimator and are never retried.
//! * **Data-contract errors** (dimension mismatch, invalid category, invalid
//!   weight) are detected before any cell of the output is touched.
//!
//! ## Invariants
//!
//! * A call that returns an error has not modified its output volume.

use thiserror::Error;

/// Errors produced by fastKDE.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KdeError {
    /// Invalid grid, kernel, or executor configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A point carries a category outside `[0, category_count)`.
    #[error("point {index} has category {category}, expected a value in [0, {category_count})")]
    InvalidCategory {
        /// Index of the first offending point.
        index: usize,
        /// The offending category, rendered as text so negative values survive.
        category: String,
        /// Number of categories declared by the grid.
        category_count: usize,
    },

    /// Point dimensionality differs from grid dimensionality.
    #[error("dimension mismatch: grid has {expected} axes, points have {found}")]
    DimensionMismatch {
        /// Grid dimensionality.
        expected: usize,
        /// Point dimensionality.
        found: usize,
    },

    /// A point weight is negative or not finite.
    #[error("point {index} has an invalid weight (weights must be finite and non-negative)")]
    InvalidWeight {
        /// Index of the first offending point.
        index: usize,
    },

    /// Input arrays disagree in length.
    #[error("mismatched inputs: {what} has length {found}, expected {expected}")]
    MismatchedInputs {
        /// Which input was inconsistent.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        found: usize,
    },

    /// The output volume does not have the shape the grid requires.
    #[error("volume shape {found:?} does not match grid shape {expected:?}")]
    ShapeMismatch {
        /// Shape derived from the grid (`[category_count, shape...]`).
        expected: Vec<usize>,
        /// Shape of the supplied volume.
        found: Vec<usize>,
    },

    /// Malformed input data (non-finite coordinates, non-contiguous arrays, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl KdeError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        KdeError::Configuration(message.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KdeError>;
