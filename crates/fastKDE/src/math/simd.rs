//! Vectorized slice kernels.
//!
//! ## Purpose
//!
//! This module provides the 4-wide `f64` primitives used by the accumulation
//! inner loop, the private-volume merge, and Pearson correlation.
//!
//! ## Design notes
//!
//! * **Portable SIMD**: uses `wide::f64x4`, which lowers to AVX/SSE/NEON or a
//!   scalar fallback depending on the target.
//! * **Lane-exact**: multiply and add are separate operations (no fused
//!   multiply-add), so each lane produces exactly the value the scalar tail
//!   would. Results do not depend on where a run starts relative to the
//!   vector width.
//!
//! ## Invariants
//!
//! * Slice arguments have equal length (debug-asserted).

use wide::f64x4;

/// Lane count of the vector type.
pub const SIMD_WIDTH: usize = 4;

#[inline(always)]
fn load(chunk: &[f64]) -> f64x4 {
    f64x4::from([chunk[0], chunk[1], chunk[2], chunk[3]])
}

#[inline(always)]
fn store(chunk: &mut [f64], v: f64x4) {
    chunk.copy_from_slice(&v.to_array());
}

/// `out[i] += alpha * x[i]`.
#[inline]
pub fn axpy(alpha: f64, x: &[f64], out: &mut [f64]) {
    debug_assert_eq!(x.len(), out.len());
    let a = f64x4::splat(alpha);
    let mut out_chunks = out.chunks_exact_mut(SIMD_WIDTH);
    let mut x_chunks = x.chunks_exact(SIMD_WIDTH);
    for (o, xs) in (&mut out_chunks).zip(&mut x_chunks) {
        let v = load(o) + a * load(xs);
        store(o, v);
    }
    for (o, &xs) in out_chunks
        .into_remainder()
        .iter_mut()
        .zip(x_chunks.remainder())
    {
        *o += alpha * xs;
    }
}

/// `out[i] += x[i]`.
#[inline]
pub fn add_assign(out: &mut [f64], x: &[f64]) {
    debug_assert_eq!(x.len(), out.len());
    let mut out_chunks = out.chunks_exact_mut(SIMD_WIDTH);
    let mut x_chunks = x.chunks_exact(SIMD_WIDTH);
    for (o, xs) in (&mut out_chunks).zip(&mut x_chunks) {
        let v = load(o) + load(xs);
        store(o, v);
    }
    for (o, &xs) in out_chunks
        .into_remainder()
        .iter_mut()
        .zip(x_chunks.remainder())
    {
        *o += xs;
    }
}

/// Sum of all elements.
#[inline]
pub fn sum(x: &[f64]) -> f64 {
    let mut acc = f64x4::splat(0.0);
    let chunks = x.chunks_exact(SIMD_WIDTH);
    let tail: f64 = chunks.remainder().iter().sum();
    for c in chunks {
        acc = acc + load(c);
    }
    let lanes = acc.to_array();
    lanes[0] + lanes[1] + lanes[2] + lanes[3] + tail
}

/// Centered second moments `(Σ(a-ma)(b-mb), Σ(a-ma)², Σ(b-mb)²)`.
#[inline]
pub fn centered_moments(a: &[f64], b: &[f64], mean_a: f64, mean_b: f64) -> (f64, f64, f64) {
    debug_assert_eq!(a.len(), b.len());
    let ma = f64x4::splat(mean_a);
    let mb = f64x4::splat(mean_b);
    let mut sab = f64x4::splat(0.0);
    let mut saa = f64x4::splat(0.0);
    let mut sbb = f64x4::splat(0.0);

    let a_chunks = a.chunks_exact(SIMD_WIDTH);
    let b_chunks = b.chunks_exact(SIMD_WIDTH);
    let (a_tail, b_tail) = (a_chunks.remainder(), b_chunks.remainder());
    for (ca, cb) in a_chunks.zip(b_chunks) {
        let da = load(ca) - ma;
        let db = load(cb) - mb;
        sab = sab + da * db;
        saa = saa + da * da;
        sbb = sbb + db * db;
    }

    let fold = |v: f64x4| {
        let l = v.to_array();
        l[0] + l[1] + l[2] + l[3]
    };
    let (mut xy, mut xx, mut yy) = (fold(sab), fold(saa), fold(sbb));
    for (&x, &y) in a_tail.iter().zip(b_tail) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        xy += dx * dy;
        xx += dx * dx;
        yy += dy * dy;
    }
    (xy, xx, yy)
}
