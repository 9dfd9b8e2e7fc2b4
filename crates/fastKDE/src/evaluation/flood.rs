//! Correlation-driven region growing.
//!
//! ## Purpose
//!
//! This module grows a connected region from a seed location of a vector
//! field, admitting face neighbours whose vector correlates with the seed's
//! vector above a threshold.
//!
//! ## Design notes
//!
//! * **Breadth-first**: the region is returned in visiting order, starting
//!   with the seed.
//! * **Face connectivity**: `2D` neighbours per location, visited axis by
//!   axis, `+1` before `-1`.
//! * **Size gate**: growth stops as soon as the region exceeds
//!   `max_pixels`; regions outside `[min_pixels, max_pixels]` are discarded
//!   and an empty region is returned.
//!
//! ## Invariants
//!
//! * Every location is visited at most once.
//! * Every returned location correlates with the seed above `threshold`,
//!   except the seed itself.

use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::evaluation::correlation::pearson_unchecked;
use crate::primitives::errors::{KdeError, Result};
use crate::primitives::volume::VectorField;

/// Region-growing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FloodFillParams {
    /// Minimum correlation with the seed for a location to join.
    pub threshold: f64,
    /// Smallest region that is kept.
    pub min_pixels: usize,
    /// Largest region that is kept.
    pub max_pixels: usize,
}

impl Default for FloodFillParams {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            min_pixels: 10,
            max_pixels: 2000,
        }
    }
}

impl FloodFillParams {
    fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(KdeError::config("flood fill threshold must be finite"));
        }
        if self.min_pixels > self.max_pixels {
            return Err(KdeError::config(format!(
                "min_pixels ({}) exceeds max_pixels ({})",
                self.min_pixels, self.max_pixels
            )));
        }
        Ok(())
    }
}

/// Grow a region from `seed` and return its locations as multi-indices.
pub fn flood_fill(
    field: &VectorField,
    seed: &[usize],
    params: &FloodFillParams,
) -> Result<Vec<Vec<usize>>> {
    params.validate()?;
    if seed.len() != field.dims() {
        return Err(KdeError::DimensionMismatch {
            expected: field.dims(),
            found: seed.len(),
        });
    }
    let start = field.location(seed).ok_or_else(|| {
        KdeError::InvalidInput(format!(
            "seed {seed:?} lies outside the field of shape {:?}",
            field.spatial_shape()
        ))
    })?;

    let shape = field.spatial_shape();
    let mut strides = vec![1usize; shape.len()];
    for axis in (0..shape.len() - 1).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }

    let reference = field.vector(start);
    let mut visited = vec![false; field.n_locations()];
    let mut queue = VecDeque::from([start]);
    let mut region = Vec::new();
    visited[start] = true;

    while let Some(loc) = queue.pop_front() {
        region.push(loc);
        if region.len() > params.max_pixels {
            debug!(max_pixels = params.max_pixels, "flood fill region too large");
            return Ok(Vec::new());
        }

        let index = field.unravel(loc);
        for (axis, &i) in index.iter().enumerate() {
            let forward = (i + 1 < shape[axis]).then(|| loc + strides[axis]);
            let backward = (i > 0).then(|| loc - strides[axis]);
            for nb in forward.into_iter().chain(backward) {
                if !visited[nb] && pearson_unchecked(reference, field.vector(nb)) > params.threshold
                {
                    visited[nb] = true;
                    queue.push_back(nb);
                }
            }
        }
    }

    if region.len() < params.min_pixels {
        debug!(
            size = region.len(),
            min_pixels = params.min_pixels,
            "flood fill region too small"
        );
        return Ok(Vec::new());
    }
    Ok(region.into_iter().map(|loc| field.unravel(loc)).collect())
}
