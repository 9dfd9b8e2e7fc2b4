//! Pre-accumulation input validation.
//!
//! ## Purpose
//!
//! This module checks a point set against a grid before any cell of the
//! output is touched, and counts the points whose footprint misses the grid.
//!
//! ## Design notes
//!
//! * **Deterministic errors**: the scan runs in parallel with `find_first`,
//!   so the reported point is always the lowest offending index regardless
//!   of thread count.
//! * **Check order**: dimensionality first, then per point the category,
//!   the coordinates, and the weight.
//!
//! ## Invariants
//!
//! * A successful validation guarantees every category converts to an index
//!   in `[0, category_count)`, every coordinate is finite, and every weight
//!   is finite and non-negative.

use std::fmt::Debug;

use num_traits::{Float, PrimInt};
use rayon::prelude::*;

use crate::input::PointSet;
use crate::math::footprint::overlaps;
use crate::math::kernel::ResolvedKernel;
use crate::primitives::errors::{KdeError, Result};
use crate::primitives::grid::Grid;

/// Stateless validation routines.
pub struct Validator;

impl Validator {
    /// Validate every point of `points` against `grid`.
    ///
    /// Runs on the current rayon pool.
    pub fn validate_points<T, K>(points: &PointSet<'_, T, K>, grid: &Grid) -> Result<()>
    where
        T: Float + Sync,
        K: PrimInt + Debug + Sync,
    {
        if points.dims() != grid.dims() {
            return Err(KdeError::DimensionMismatch {
                expected: grid.dims(),
                found: points.dims(),
            });
        }

        let category_count = grid.category_count();
        let first_bad = (0..points.len())
            .into_par_iter()
            .find_first(|&i| Self::check_point(points, i, category_count).is_err());

        match first_bad {
            Some(i) => Self::check_point(points, i, category_count),
            None => Ok(()),
        }
    }

    /// Check a single point.
    pub fn check_point<T, K>(
        points: &PointSet<'_, T, K>,
        i: usize,
        category_count: usize,
    ) -> Result<()>
    where
        T: Float,
        K: PrimInt + Debug,
    {
        match points.category(i) {
            Some(c) if c < category_count => {}
            _ => {
                return Err(KdeError::InvalidCategory {
                    index: i,
                    category: format!("{:?}", points.categories()[i]),
                    category_count,
                })
            }
        }

        if points.point(i).iter().any(|c| !c.is_finite()) {
            return Err(KdeError::InvalidInput(format!(
                "point {i} has a non-finite coordinate"
            )));
        }

        let w = points.weight(i);
        if !(w.is_finite() && w >= 0.0) {
            return Err(KdeError::InvalidWeight { index: i });
        }
        Ok(())
    }

    /// Number of points whose footprint does not touch the grid.
    ///
    /// Points must already be validated. Runs on the current rayon pool.
    pub fn count_outside<T, K>(
        points: &PointSet<'_, T, K>,
        grid: &Grid,
        kernel: &ResolvedKernel,
    ) -> usize
    where
        T: Float + Sync,
        K: PrimInt + Debug + Sync,
    {
        let dims = grid.dims();
        (0..points.len())
            .into_par_iter()
            .map_init(
                || vec![0.0; dims],
                |u, i| {
                    points.fractional_into(i, grid, u);
                    !overlaps(u, kernel, grid.shape())
                },
            )
            .filter(|&outside| outside)
            .count()
    }
}
