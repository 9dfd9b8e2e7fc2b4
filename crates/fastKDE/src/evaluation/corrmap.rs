//! Local correlation maps.
//!
//! ## Purpose
//!
//! This module measures how similar every location of a vector field is to
//! its surroundings, either against the summed vectors of its neighbourhood
//! ([`local_correlation_map`]) or against each neighbour separately
//! ([`neighbor_correlations`]).
//!
//! ## Design notes
//!
//! * **Neighbourhood**: the `(2r + 1)^D - 1` locations of the cube of
//!   half-width `r` around a location, excluding the location itself,
//!   enumerated in row-major offset order.
//! * **Flat offsets**: neighbour positions are precomputed as signed flat
//!   offsets, valid for every interior location.
//! * **Borders**: locations closer than `r` to any edge have an incomplete
//!   neighbourhood and are reported as `NaN`. A radius too wide for the
//!   field leaves no interior location and yields an all-`NaN` result
//!   without enumerating the neighbourhood.

use ndarray::{ArrayD, IxDyn};
use rayon::prelude::*;

use crate::engine::executor::Executor;
use crate::evaluation::correlation::pearson_unchecked;
use crate::math::simd::add_assign;
use crate::primitives::errors::{KdeError, Result};
use crate::primitives::volume::VectorField;

/// Number of neighbours of an interior location.
///
/// Fails with [`KdeError::Configuration`] when the count overflows `usize`.
pub fn neighborhood_size(dims: usize, radius: usize) -> Result<usize> {
    Ok(cube_volume(dims, radius)? - 1)
}

/// `(2r + 1)^D`, checked.
fn cube_volume(dims: usize, radius: usize) -> Result<usize> {
    radius
        .checked_mul(2)
        .and_then(|d| d.checked_add(1))
        .zip(u32::try_from(dims).ok())
        .and_then(|(side, exp)| side.checked_pow(exp))
        .ok_or_else(|| {
            KdeError::config(format!(
                "neighbourhood of radius {radius} in {dims} dimensions is too large"
            ))
        })
}

/// Whether some location has a complete neighbourhood.
fn has_interior(shape: &[usize], radius: usize) -> bool {
    shape.iter().all(|&n| radius < n && n - radius > radius)
}

/// Signed flat offsets of the neighbourhood in row-major order.
fn neighbor_offsets(shape: &[usize], radius: usize) -> Result<Vec<isize>> {
    let dims = shape.len();
    let mut strides = vec![1isize; dims];
    for axis in (0..dims.saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1] as isize;
    }

    let r = radius as isize;
    let side = 2 * radius + 1;
    let total = cube_volume(dims, radius)?;
    let mut offsets = Vec::with_capacity(total - 1);
    for k in 0..total {
        let mut rem = k;
        let mut flat = 0isize;
        for axis in (0..dims).rev() {
            let d = (rem % side) as isize - r;
            rem /= side;
            flat += d * strides[axis];
        }
        if k != total / 2 {
            offsets.push(flat);
        }
    }
    Ok(offsets)
}

/// Whether every axis index of `loc` is at least `radius` away from the edges.
#[inline]
fn is_interior(mut loc: usize, shape: &[usize], radius: usize) -> bool {
    for &n in shape.iter().rev() {
        let i = loc % n;
        loc /= n;
        if i < radius || i + radius >= n {
            return false;
        }
    }
    true
}

fn check_radius(radius: usize) -> Result<()> {
    if radius == 0 {
        return Err(KdeError::config("neighbourhood radius must be at least 1"));
    }
    Ok(())
}

/// Correlation of each location with the sum of its neighbours' vectors.
///
/// The output has the field's spatial shape; border locations are `NaN`.
pub fn local_correlation_map(
    field: &VectorField,
    radius: usize,
    executor: &Executor,
) -> Result<ArrayD<f64>> {
    check_radius(radius)?;
    let shape = field.spatial_shape();
    if !has_interior(shape, radius) {
        return Ok(ArrayD::from_elem(IxDyn(shape), f64::NAN));
    }
    let offsets = neighbor_offsets(shape, radius)?;
    let width = field.n_features();

    let map: Vec<f64> = executor.install(|| {
        (0..field.n_locations())
            .into_par_iter()
            .map_init(
                || vec![0.0; width],
                |summed, loc| {
                    if !is_interior(loc, shape, radius) {
                        return f64::NAN;
                    }
                    summed.fill(0.0);
                    for &off in &offsets {
                        let nb = (loc as isize + off) as usize;
                        add_assign(summed, field.vector(nb));
                    }
                    pearson_unchecked(field.vector(loc), summed)
                },
            )
            .collect()
    });

    ArrayD::from_shape_vec(IxDyn(shape), map)
        .map_err(|e| KdeError::InvalidInput(format!("correlation map shape: {e}")))
}

/// Correlation of each location with every neighbour separately.
///
/// The output shape is the field's spatial shape followed by
/// [`neighborhood_size`]; border locations are `NaN` throughout.
pub fn neighbor_correlations(
    field: &VectorField,
    radius: usize,
    executor: &Executor,
) -> Result<ArrayD<f64>> {
    check_radius(radius)?;
    let shape = field.spatial_shape();
    let k = neighborhood_size(shape.len(), radius)?;
    let mut full_shape = shape.to_vec();
    full_shape.push(k);
    if !has_interior(shape, radius) {
        return full_shape
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .filter(|&len| len <= isize::MAX as usize / std::mem::size_of::<f64>())
            .map(|_| ArrayD::from_elem(IxDyn(&full_shape), f64::NAN))
            .ok_or_else(|| {
                KdeError::config(format!(
                    "{k} neighbours per location do not fit in one array"
                ))
            });
    }
    let offsets = neighbor_offsets(shape, radius)?;

    let mut out = vec![f64::NAN; field.n_locations() * k];
    executor.install(|| {
        out.par_chunks_mut(k)
            .enumerate()
            .filter(|(loc, _)| is_interior(*loc, shape, radius))
            .for_each(|(loc, row)| {
                let center = field.vector(loc);
                for (slot, &off) in row.iter_mut().zip(&offsets) {
                    let nb = (loc as isize + off) as usize;
                    *slot = pearson_unchecked(center, field.vector(nb));
                }
            });
    });

    ArrayD::from_shape_vec(IxDyn(&full_shape), out)
        .map_err(|e| KdeError::InvalidInput(format!("neighbour correlation shape: {e}")))
}
