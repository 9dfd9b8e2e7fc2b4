//! Dense output containers.
//!
//! ## Purpose
//!
//! This module provides the caller-owned [`DensityVolume`] that the kernel
//! accumulates into, a sparse export of its non-zero cells, and the
//! location-major [`VectorField`] consumed by signature analysis.
//!
//! ## Design notes
//!
//! * **Layout**: `DensityVolume` is category-major, `[category_count, shape...]`,
//!   with the last spatial axis contiguous. This keeps the SIMD inner loop of
//!   the kernel on unit-stride memory.
//! * **Ownership**: volumes are allocated and released by the caller; the
//!   kernel only ever adds to them.
//! * **Vector fields** transpose a volume to `[location, category]` so every
//!   location's expression signature is a contiguous slice.
//!
//! ## Invariants
//!
//! * Backing arrays are always in standard (C-contiguous) layout.
//! * A `VectorField` row count equals the product of its spatial shape.

use ndarray::{Array2, ArrayD, ArrayView2, ArrayViewD, ArrayViewMutD, Axis, Dimension, IxDyn};

use crate::primitives::errors::{KdeError, Result};
use crate::primitives::grid::Grid;

// ============================================================================
// Density Volume
// ============================================================================

/// Dense per-category accumulator array.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityVolume {
    data: ArrayD<f64>,
}

impl DensityVolume {
    /// Allocate a zeroed volume matching `grid`.
    pub fn zeros(grid: &Grid) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(&grid.volume_shape())),
        }
    }

    /// Wrap an existing array; its shape must be `[category_count, shape...]`.
    pub fn from_array(data: ArrayD<f64>, grid: &Grid) -> Result<Self> {
        let expected = grid.volume_shape();
        if data.shape() != expected.as_slice() {
            return Err(KdeError::ShapeMismatch {
                expected,
                found: data.shape().to_vec(),
            });
        }
        if !data.is_standard_layout() {
            return Err(KdeError::InvalidInput(
                "density volume must be in standard (C-contiguous) layout".to_string(),
            ));
        }
        Ok(Self { data })
    }

    /// Full shape `[category_count, shape...]`.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Number of category channels.
    pub fn category_count(&self) -> usize {
        self.data.shape()[0]
    }

    /// Spatial part of the shape.
    pub fn spatial_shape(&self) -> &[usize] {
        &self.data.shape()[1..]
    }

    /// Number of cells per channel.
    pub fn spatial_len(&self) -> usize {
        self.spatial_shape().iter().product()
    }

    /// Check that this volume can receive output for `grid`.
    pub fn check_grid(&self, grid: &Grid) -> Result<()> {
        let expected = grid.volume_shape();
        if self.shape() != expected.as_slice() {
            return Err(KdeError::ShapeMismatch {
                expected,
                found: self.shape().to_vec(),
            });
        }
        Ok(())
    }

    /// Read-only array view.
    pub fn as_array(&self) -> ArrayViewD<'_, f64> {
        self.data.view()
    }

    /// Mutable array view.
    pub fn as_array_mut(&mut self) -> ArrayViewMutD<'_, f64> {
        self.data.view_mut()
    }

    /// Consume the volume and return the backing array.
    pub fn into_array(self) -> ArrayD<f64> {
        self.data
    }

    /// All cells in memory order.
    pub fn as_slice(&self) -> &[f64] {
        self.data.as_slice().unwrap_or(&[])
    }

    pub(crate) fn cells_mut(&mut self) -> Result<&mut [f64]> {
        self.data
            .as_slice_mut()
            .ok_or_else(|| KdeError::InvalidInput("density volume is not contiguous".to_string()))
    }

    /// One category channel.
    pub fn channel(&self, category: usize) -> Option<ArrayViewD<'_, f64>> {
        (category < self.category_count()).then(|| self.data.index_axis(Axis(0), category))
    }

    /// Value at `(category, index)`, `None` when out of range.
    pub fn get(&self, category: usize, index: &[usize]) -> Option<f64> {
        let mut full = Vec::with_capacity(index.len() + 1);
        full.push(category);
        full.extend_from_slice(index);
        self.data.get(IxDyn(&full)).copied()
    }

    /// Sum over every cell of every channel.
    pub fn sum(&self) -> f64 {
        self.data.sum()
    }

    /// Sum over one channel.
    pub fn channel_sum(&self, category: usize) -> Option<f64> {
        self.channel(category).map(|c| c.sum())
    }

    /// Zero every cell, keeping the allocation.
    pub fn reset(&mut self) {
        self.data.fill(0.0);
    }

    /// Export non-zero cells as a coordinate list.
    pub fn to_sparse(&self) -> SparseDensity {
        let shape = self.shape().to_vec();
        let rank = shape.len();
        let mut coords = Vec::new();
        let mut values = Vec::new();
        for (index, &value) in self.data.indexed_iter() {
            if value != 0.0 {
                coords.extend_from_slice(index.slice());
                values.push(value);
            }
        }
        debug_assert_eq!(coords.len(), values.len() * rank);
        SparseDensity {
            shape,
            coords,
            values,
        }
    }

    /// Transpose into a location-major vector field.
    pub fn to_vector_field(&self) -> VectorField {
        let categories = self.category_count();
        let locations = self.spatial_len();
        let data = self.as_slice();
        let mut field = Array2::<f64>::zeros((locations, categories));
        for (category, channel) in data.chunks_exact(locations.max(1)).enumerate() {
            field
                .column_mut(category)
                .iter_mut()
                .zip(channel)
                .for_each(|(dst, &src)| *dst = src);
        }
        VectorField {
            spatial_shape: self.spatial_shape().to_vec(),
            data: field,
        }
    }
}

// ============================================================================
// Sparse Export
// ============================================================================

/// Coordinate-list form of the non-zero cells of a [`DensityVolume`].
#[derive(Debug, Clone, PartialEq)]
pub struct SparseDensity {
    /// Shape of the dense volume this was exported from.
    pub shape: Vec<usize>,
    /// Row-major `nnz × rank` indices; the first column is the category.
    pub coords: Vec<usize>,
    /// Cell values, one per coordinate row.
    pub values: Vec<f64>,
}

impl SparseDensity {
    /// Number of stored cells.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate `(index, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&[usize], f64)> + '_ {
        let rank = self.shape.len().max(1);
        self.coords.chunks_exact(rank).zip(self.values.iter().copied())
    }
}

// ============================================================================
// Vector Field
// ============================================================================

/// Per-location feature vectors, `[n_locations, n_features]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    spatial_shape: Vec<usize>,
    data: Array2<f64>,
}

impl VectorField {
    /// Wrap a location-major matrix whose rows follow `spatial_shape` in row-major order.
    pub fn new(spatial_shape: Vec<usize>, data: Array2<f64>) -> Result<Self> {
        if spatial_shape.is_empty() {
            return Err(KdeError::InvalidInput(
                "vector field needs at least one spatial axis".to_string(),
            ));
        }
        let locations: usize = spatial_shape.iter().product();
        if data.nrows() != locations {
            return Err(KdeError::MismatchedInputs {
                what: "vector field rows",
                expected: locations,
                found: data.nrows(),
            });
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self {
            spatial_shape,
            data,
        })
    }

    /// Spatial shape of the field.
    pub fn spatial_shape(&self) -> &[usize] {
        &self.spatial_shape
    }

    /// Number of spatial axes.
    pub fn dims(&self) -> usize {
        self.spatial_shape.len()
    }

    /// Number of locations (rows).
    pub fn n_locations(&self) -> usize {
        self.data.nrows()
    }

    /// Length of each feature vector.
    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    /// Matrix view, `[n_locations, n_features]`.
    pub fn as_array(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Feature vector at a flat location.
    #[inline]
    pub fn vector(&self, location: usize) -> &[f64] {
        let width = self.n_features();
        let start = location * width;
        &self.data.as_slice().unwrap_or(&[])[start..start + width]
    }

    /// Row-major flat location of a multi-index, `None` when out of range.
    pub fn location(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.spatial_shape.len() {
            return None;
        }
        let mut flat = 0usize;
        for (&i, &n) in index.iter().zip(&self.spatial_shape) {
            if i >= n {
                return None;
            }
            flat = flat * n + i;
        }
        Some(flat)
    }

    /// Multi-index of a flat location.
    pub fn unravel(&self, mut location: usize) -> Vec<usize> {
        let mut index = vec![0usize; self.spatial_shape.len()];
        for (slot, &n) in index.iter_mut().zip(&self.spatial_shape).rev() {
            *slot = location % n;
            location /= n;
        }
        index
    }
}
