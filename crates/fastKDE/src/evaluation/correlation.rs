//! Pearson correlation of expression signatures.
//!
//! ## Purpose
//!
//! This module provides the correlation coefficient used by every signature
//! analysis routine (cell-type maps, correlation maps, flood fill).
//!
//! ## Design notes
//!
//! * **Two-pass**: means first, then centred cross and square sums. This
//!   avoids the cancellation of the one-pass `E[x²] - E[x]²` form on large,
//!   nearly constant vectors.
//! * **SIMD**: both passes use `wide::f64x4` via [`crate::math::simd`].
//!
//! ## Invariants
//!
//! * The result lies in `[-1, 1]`.
//! * A vector with zero variance (including an empty one) yields `0.0`.

use crate::math::simd::{centered_moments, sum};
use crate::primitives::errors::{KdeError, Result};

/// Pearson correlation coefficient of two equally long vectors.
pub fn pearson(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(KdeError::MismatchedInputs {
            what: "correlation operand",
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(pearson_unchecked(a, b))
}

/// [`pearson`] without the length check; `a` and `b` must be equally long.
#[inline]
pub(crate) fn pearson_unchecked(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len();
    if n == 0 {
        return 0.0;
    }
    let mean_a = sum(a) / n as f64;
    let mean_b = sum(b) / n as f64;
    let (xy, xx, yy) = centered_moments(a, b, mean_a, mean_b);
    if xx <= 0.0 || yy <= 0.0 {
        return 0.0;
    }
    (xy / (xx * yy).sqrt()).clamp(-1.0, 1.0)
}
