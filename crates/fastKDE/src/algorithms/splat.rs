//! Per-point accumulation.
//!
//! ## Purpose
//!
//! This module adds one point's separable footprint into a slab of a
//! category channel. A slab is a run of whole rows along axis 0, which is
//! either the full channel or one tile of it.
//!
//! ## Design notes
//!
//! * **Odometer**: the outer axes (all but the last) are walked with a
//!   mixed-radix counter; for each outer position the prefactor
//!   `weight * Π w_a[i_a]` is formed in axis order.
//! * **Contiguous inner run**: the last axis is a unit-stride run updated
//!   with a single SIMD `axpy`.
//! * **Deterministic arithmetic**: every strategy calls this function, so a
//!   given point adds bit-identical values to a given cell everywhere.
//!
//! ## Invariants
//!
//! * The buffer holds a non-empty footprint whose axis-0 range lies inside
//!   `[row_offset, row_offset + slab rows)`.
//! * `strides` are the row-major spatial strides of the grid.

use crate::math::simd::axpy;
use crate::primitives::buffer::FootprintBuffer;

/// Add `weight` times the footprint in `buf` into `slab`.
///
/// `slab` starts at row `row_offset` of axis 0.
pub fn splat_point(
    buf: &mut FootprintBuffer,
    weight: f64,
    strides: &[usize],
    row_offset: usize,
    slab: &mut [f64],
) {
    let FootprintBuffer {
        starts,
        weights,
        cursor,
        ..
    } = buf;

    let dims = starts.len();
    let inner = dims - 1;
    let slab_origin = row_offset * strides[0];
    let run = &weights[inner];
    let run_start = starts[inner];

    if inner == 0 {
        let begin = run_start - slab_origin;
        axpy(weight, run, &mut slab[begin..begin + run.len()]);
        return;
    }

    cursor.clear();
    cursor.resize(inner, 0);
    loop {
        let mut offset = run_start;
        let mut prefactor = weight;
        for axis in 0..inner {
            let i = cursor[axis];
            offset += (starts[axis] + i) * strides[axis];
            prefactor *= weights[axis][i];
        }

        if prefactor != 0.0 {
            let begin = offset - slab_origin;
            axpy(prefactor, run, &mut slab[begin..begin + run.len()]);
        }

        // Advance the odometer, last outer axis fastest.
        let mut axis = inner;
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            cursor[axis] += 1;
            if cursor[axis] < weights[axis].len() {
                break;
            }
            cursor[axis] = 0;
        }
    }
}
