//! Cell-type maps.
//!
//! ## Purpose
//!
//! This module scores every location of a vector field against one
//! cell-type centroid, producing a map of Pearson correlations with the
//! field's spatial shape.
//!
//! ## Invariants
//!
//! * The centroid length equals the field's feature count.
//! * Output shape equals the field's spatial shape.

use ndarray::{ArrayD, IxDyn};
use rayon::prelude::*;

use crate::engine::executor::Executor;
use crate::evaluation::correlation::pearson_unchecked;
use crate::primitives::errors::{KdeError, Result};
use crate::primitives::volume::VectorField;

/// Correlation of `centroid` with the vector at every location of `field`.
pub fn cell_type_map(
    centroid: &[f64],
    field: &VectorField,
    executor: &Executor,
) -> Result<ArrayD<f64>> {
    if centroid.len() != field.n_features() {
        return Err(KdeError::MismatchedInputs {
            what: "centroid",
            expected: field.n_features(),
            found: centroid.len(),
        });
    }

    let scores: Vec<f64> = executor.install(|| {
        (0..field.n_locations())
            .into_par_iter()
            .map(|loc| pearson_unchecked(centroid, field.vector(loc)))
            .collect()
    });

    ArrayD::from_shape_vec(IxDyn(field.spatial_shape()), scores)
        .map_err(|e| KdeError::InvalidInput(format!("cell type map shape: {e}")))
}
