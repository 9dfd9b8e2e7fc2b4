//! Footprint geometry.
//!
//! ## Purpose
//!
//! This module computes which cells a point influences and with what
//! separable weights. A footprint is the axis-aligned box
//! `[ceil(u - r), floor(u + r)]` per axis, clipped to the grid, where `u` is
//! the fractional cell coordinate and `r` the truncation radius in cells.
//!
//! ## Invariants
//!
//! * Cells outside the box are never visited, so they receive exactly zero.
//! * A point whose box misses the grid on any axis has an empty footprint.

use std::ops::Range;

use crate::math::kernel::ResolvedKernel;
use crate::primitives::buffer::FootprintBuffer;

/// Clipped half-open index range covered on one axis, `None` if empty.
#[inline]
pub fn axis_span(u: f64, radius: f64, len: usize) -> Option<Range<usize>> {
    let lo = (u - radius).ceil();
    let hi = (u + radius).floor();
    let last = (len - 1) as f64;
    if !(hi >= 0.0 && lo <= last && lo <= hi) {
        return None;
    }
    let lo = lo.max(0.0) as usize;
    let hi = hi.min(last) as usize + 1;
    Some(lo..hi)
}

/// Whether a point at fractional coordinates `u` touches any cell of `shape`.
pub fn overlaps(u: &[f64], kernel: &ResolvedKernel, shape: &[usize]) -> bool {
    u.iter()
        .zip(shape)
        .enumerate()
        .all(|(axis, (&ua, &len))| axis_span(ua, kernel.radius(axis), len).is_some())
}

/// Fill `buf` with the footprint of the point whose fractional coordinates
/// are in `buf.coords`, restricting axis 0 to `rows`.
///
/// Returns `false` (leaving the buffer contents unspecified) when the
/// restricted footprint is empty.
pub fn fill(
    buf: &mut FootprintBuffer,
    kernel: &ResolvedKernel,
    shape: &[usize],
    rows: Range<usize>,
) -> bool {
    let FootprintBuffer {
        starts,
        weights,
        coords,
        ..
    } = buf;

    for (axis, &len) in shape.iter().enumerate() {
        let u = coords[axis];
        let Some(mut span) = axis_span(u, kernel.radius(axis), len) else {
            return false;
        };
        if axis == 0 {
            span = span.start.max(rows.start)..span.end.min(rows.end);
            if span.is_empty() {
                return false;
            }
        }
        starts[axis] = span.start;
        let w = &mut weights[axis];
        w.clear();
        w.extend(span.map(|i| kernel.weight(axis, i as f64 - u)));
    }
    true
}
