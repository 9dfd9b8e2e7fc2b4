//! Input abstractions for density accumulation.
//!
//! ## Purpose
//!
//! This module provides a unified abstraction over point inputs, allowing the
//! estimator to consume slices, vectors, and `ndarray` arrays through a
//! single interface, and the [`PointSet`] view that bundles coordinates,
//! categories, and optional weights.
//!
//! ## Design notes
//!
//! * **Zero-copy**: every input is borrowed as a contiguous slice.
//! * **Structure of arrays**: coordinates are flattened row-major (`n × D`),
//!   categories and weights are parallel arrays of length `n`.
//! * **Generic scalars**: coordinates and weights may be `f32` or `f64`;
//!   categories may be any primitive integer. Arithmetic inside the kernel
//!   is always `f64`.
//!
//! ## Invariants
//!
//! * Returned slices cover every element of the input container.
//! * Non-contiguous arrays are rejected with [`KdeError::InvalidInput`].
//! * `coords.len() == n * dims` and, when present, `weights.len() == n`.
//!
//! ## Non-goals
//!
//! * This module does not validate values (finiteness, category range);
//!   that happens in the engine before accumulation starts.

use std::fmt::Debug;

use ndarray::{ArrayBase, Data, Ix1, Ix2};
use num_traits::{Float, PrimInt};

use crate::primitives::errors::{KdeError, Result};
use crate::primitives::grid::Grid;

/// Types that can be borrowed as a contiguous slice of inputs.
pub trait KdeInput<T> {
    /// Borrow the input as a contiguous slice.
    fn as_kde_slice(&self) -> Result<&[T]>;
}

impl<T> KdeInput<T> for [T] {
    fn as_kde_slice(&self) -> Result<&[T]> {
        Ok(self)
    }
}

impl<T, const N: usize> KdeInput<T> for [T; N] {
    fn as_kde_slice(&self) -> Result<&[T]> {
        Ok(self.as_slice())
    }
}

impl<T> KdeInput<T> for Vec<T> {
    fn as_kde_slice(&self) -> Result<&[T]> {
        Ok(self.as_slice())
    }
}

impl<T, S> KdeInput<T> for ArrayBase<S, Ix1>
where
    S: Data<Elem = T>,
{
    fn as_kde_slice(&self) -> Result<&[T]> {
        self.as_slice().ok_or_else(|| {
            KdeError::InvalidInput("ndarray input must be contiguous in memory".to_string())
        })
    }
}

impl<T, S> KdeInput<T> for ArrayBase<S, Ix2>
where
    S: Data<Elem = T>,
{
    fn as_kde_slice(&self) -> Result<&[T]> {
        self.as_slice().ok_or_else(|| {
            KdeError::InvalidInput(
                "ndarray coordinates must be in standard (row-major) layout".to_string(),
            )
        })
    }
}

// ============================================================================
// Point Set
// ============================================================================

/// Borrowed, categorized, optionally weighted point cloud.
#[derive(Debug, Clone, Copy)]
pub struct PointSet<'a, T, K> {
    coords: &'a [T],
    categories: &'a [K],
    weights: Option<&'a [T]>,
    dims: usize,
}

impl<'a, T, K> PointSet<'a, T, K>
where
    T: Float,
    K: PrimInt + Debug,
{
    /// Bundle flattened row-major coordinates with one category per point.
    pub fn new<C, L>(coords: &'a C, dims: usize, categories: &'a L) -> Result<Self>
    where
        C: KdeInput<T> + ?Sized,
        L: KdeInput<K> + ?Sized,
    {
        if dims == 0 {
            return Err(KdeError::InvalidInput(
                "points must have at least one coordinate".to_string(),
            ));
        }
        let coords = coords.as_kde_slice()?;
        let categories = categories.as_kde_slice()?;
        let expected = categories
            .len()
            .checked_mul(dims)
            .ok_or_else(|| KdeError::InvalidInput("point count overflows usize".to_string()))?;
        if coords.len() != expected {
            return Err(KdeError::MismatchedInputs {
                what: "coordinates",
                expected,
                found: coords.len(),
            });
        }
        Ok(Self {
            coords,
            categories,
            weights: None,
            dims,
        })
    }

    /// Bundle an `n × D` coordinate array with one category per row.
    pub fn from_array<S, L>(coords: &'a ArrayBase<S, Ix2>, categories: &'a L) -> Result<Self>
    where
        S: Data<Elem = T>,
        L: KdeInput<K> + ?Sized,
    {
        Self::new(coords, coords.ncols(), categories)
    }

    /// Attach per-point weights (default 1.0).
    pub fn with_weights<W>(mut self, weights: &'a W) -> Result<Self>
    where
        W: KdeInput<T> + ?Sized,
    {
        let weights = weights.as_kde_slice()?;
        if weights.len() != self.len() {
            return Err(KdeError::MismatchedInputs {
                what: "weights",
                expected: self.len(),
                found: weights.len(),
            });
        }
        self.weights = Some(weights);
        Ok(self)
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the set holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Coordinates per point.
    #[inline]
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Flattened coordinates.
    pub fn coords(&self) -> &'a [T] {
        self.coords
    }

    /// Raw category labels.
    pub fn categories(&self) -> &'a [K] {
        self.categories
    }

    /// Raw weights, if any.
    pub fn weights(&self) -> Option<&'a [T]> {
        self.weights
    }

    /// Coordinates of point `i`.
    #[inline]
    pub fn point(&self, i: usize) -> &'a [T] {
        &self.coords[i * self.dims..(i + 1) * self.dims]
    }

    /// Category of point `i` as an index, `None` if it is negative or
    /// does not fit in `usize`.
    #[inline]
    pub fn category(&self, i: usize) -> Option<usize> {
        self.categories[i].to_usize()
    }

    /// Weight of point `i` as `f64`.
    #[inline]
    pub fn weight(&self, i: usize) -> f64 {
        self.weights
            .map_or(1.0, |w| w[i].to_f64().unwrap_or(f64::NAN))
    }

    /// Write the fractional cell coordinates of point `i` into `out`.
    #[inline]
    pub fn fractional_into(&self, i: usize, grid: &Grid, out: &mut [f64]) {
        for (axis, (slot, &c)) in out.iter_mut().zip(self.point(i)).enumerate() {
            *slot = grid.fractional(axis, c.to_f64().unwrap_or(f64::NAN));
        }
    }
}
