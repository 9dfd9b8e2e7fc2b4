//! Sampling lattice definition.
//!
//! ## Purpose
//!
//! This module defines [`Grid`], the immutable description of the lattice
//! onto which point contributions are accumulated: origin, per-axis spacing,
//! per-axis cell counts, and the number of category channels.
//!
//! ## Design notes
//!
//! * **Eager validation**: every invariant is checked in [`Grid::new`].
//! * **Row-major**: the last axis varies fastest in memory.
//! * **Lattice samples**: cell `i` on axis `a` is sampled at
//!   `origin[a] + i * spacing[a]`.
//!
//! ## Invariants
//!
//! * `origin`, `spacing` and `shape` have the same, non-zero length.
//! * Spacing is finite and strictly positive; origin is finite.
//! * Every shape entry and `category_count` is at least 1.
//! * `category_count * prod(shape)` fits in `usize`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::primitives::errors::{KdeError, Result};

/// Immutable lattice description shared read-only by all workers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "GridParts", into = "GridParts")
)]
pub struct Grid {
    origin: Vec<f64>,
    spacing: Vec<f64>,
    shape: Vec<usize>,
    category_count: usize,
    strides: Vec<usize>,
}

/// Serialized form of a [`Grid`]; deserialization re-runs validation.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct GridParts {
    origin: Vec<f64>,
    spacing: Vec<f64>,
    shape: Vec<usize>,
    category_count: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<GridParts> for Grid {
    type Error = KdeError;

    fn try_from(parts: GridParts) -> Result<Self> {
        Grid::new(parts.origin, parts.spacing, parts.shape, parts.category_count)
    }
}

#[cfg(feature = "serde")]
impl From<Grid> for GridParts {
    fn from(grid: Grid) -> Self {
        GridParts {
            origin: grid.origin,
            spacing: grid.spacing,
            shape: grid.shape,
            category_count: grid.category_count,
        }
    }
}

impl Grid {
    /// Create a validated grid.
    pub fn new(
        origin: Vec<f64>,
        spacing: Vec<f64>,
        shape: Vec<usize>,
        category_count: usize,
    ) -> Result<Self> {
        let dims = shape.len();
        if dims == 0 {
            return Err(KdeError::config("grid must have at least one axis"));
        }
        if origin.len() != dims || spacing.len() != dims {
            return Err(KdeError::config(format!(
                "origin ({}), spacing ({}) and shape ({}) must have the same length",
                origin.len(),
                spacing.len(),
                dims
            )));
        }
        if let Some(axis) = origin.iter().position(|o| !o.is_finite()) {
            return Err(KdeError::config(format!("origin on axis {axis} must be finite")));
        }
        if let Some(axis) = spacing.iter().position(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(KdeError::config(format!(
                "spacing on axis {axis} must be finite and > 0, got {}",
                spacing[axis]
            )));
        }
        if let Some(axis) = shape.iter().position(|&n| n == 0) {
            return Err(KdeError::config(format!("shape on axis {axis} must be > 0")));
        }
        if category_count == 0 {
            return Err(KdeError::config("category_count must be > 0"));
        }

        shape
            .iter()
            .try_fold(category_count, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| KdeError::config("grid element count overflows usize"))?;

        let mut strides = vec![1usize; dims];
        for axis in (0..dims - 1).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }

        Ok(Self {
            origin,
            spacing,
            shape,
            category_count,
            strides,
        })
    }

    /// Grid with origin zero and unit spacing.
    pub fn unit(shape: Vec<usize>, category_count: usize) -> Result<Self> {
        let dims = shape.len();
        Self::new(vec![0.0; dims], vec![1.0; dims], shape, category_count)
    }

    /// Number of spatial axes.
    #[inline]
    pub fn dims(&self) -> usize {
        self.shape.len()
    }

    /// World coordinate of cell 0 on each axis.
    #[inline]
    pub fn origin(&self) -> &[f64] {
        &self.origin
    }

    /// Cell size on each axis.
    #[inline]
    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    /// Number of cells on each axis.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of category channels.
    #[inline]
    pub fn category_count(&self) -> usize {
        self.category_count
    }

    /// Row-major strides of the spatial part (in cells).
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of cells in one category channel.
    #[inline]
    pub fn spatial_len(&self) -> usize {
        self.strides[0] * self.shape[0]
    }

    /// Full output shape `[category_count, shape...]`.
    pub fn volume_shape(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.dims() + 1);
        out.push(self.category_count);
        out.extend_from_slice(&self.shape);
        out
    }

    /// Fractional cell coordinate of a world position along one axis.
    #[inline]
    pub fn fractional(&self, axis: usize, coordinate: f64) -> f64 {
        (coordinate - self.origin[axis]) / self.spacing[axis]
    }

    /// `floor((p - origin) / spacing)` per axis, or `None` if `p` falls outside.
    pub fn cell_index(&self, point: &[f64]) -> Option<Vec<usize>> {
        if point.len() != self.dims() {
            return None;
        }
        point
            .iter()
            .enumerate()
            .map(|(axis, &p)| {
                let cell = self.fractional(axis, p).floor();
                if cell >= 0.0 && cell < self.shape[axis] as f64 {
                    Some(cell as usize)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Flat spatial offset of a multi-index.
    #[inline]
    pub fn flat_index(&self, index: &[usize]) -> usize {
        index
            .iter()
            .zip(&self.strides)
            .map(|(&i, &stride)| i * stride)
            .sum()
    }
}
