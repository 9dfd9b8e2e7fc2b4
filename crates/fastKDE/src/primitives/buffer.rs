//! Per-worker scratch space.
//!
//! ## Purpose
//!
//! This module provides [`FootprintBuffer`], the reusable storage for one
//! point's footprint: the clipped start index and separable weight vector of
//! every axis, plus the odometer used to walk the outer axes.
//!
//! ## Design notes
//!
//! * **Allocation-free hot loop**: workers create one buffer (via rayon's
//!   `*_init` combinators) and refill it for every point.
//! * **Separable storage**: a footprint of `Π len_a` cells is stored as
//!   `Σ len_a` weights.
//!
//! ## Invariants
//!
//! * After a successful fill, `weights[a].len() >= 1` for every axis and
//!   `starts[a] + weights[a].len() <= shape[a]`.

/// Scratch storage for a single point footprint.
#[derive(Debug, Clone, Default)]
pub struct FootprintBuffer {
    /// First covered cell per axis.
    pub starts: Vec<usize>,
    /// Kernel weight per covered cell, per axis.
    pub weights: Vec<Vec<f64>>,
    /// Odometer over the outer axes.
    pub cursor: Vec<usize>,
    /// Fractional cell coordinate per axis.
    pub coords: Vec<f64>,
}

impl FootprintBuffer {
    /// Create a buffer for `dims` axes.
    pub fn new(dims: usize) -> Self {
        Self {
            starts: vec![0; dims],
            weights: (0..dims).map(|_| Vec::new()).collect(),
            cursor: vec![0; dims.saturating_sub(1)],
            coords: vec![0.0; dims],
        }
    }

    /// Number of axes.
    #[inline]
    pub fn dims(&self) -> usize {
        self.starts.len()
    }

    /// Number of cells covered by the current footprint.
    pub fn cell_count(&self) -> usize {
        self.weights.iter().map(Vec::len).product()
    }
}
