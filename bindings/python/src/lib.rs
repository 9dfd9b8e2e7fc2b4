//! Python bindings for fastKDE.
//!
//! Provides Python access to the fastKDE Rust library via PyO3.

#![allow(non_snake_case)]
#![deny(missing_docs)]

use ndarray::{Array2, ArrayD};
use numpy::{IntoPyArray, PyArrayDyn, PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArrayDyn};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::fmt::Display;

use ::fastKDE::prelude::{
    cell_type_map, flood_fill as grow_region, local_correlation_map, neighbor_correlations,
    pearson, Batch, Executor, FloodFillParams, Grid, Kde, KernelFamily, KernelSpec,
    Normalization, Parallelism, PointSet, Strategy, Truncation, VectorField,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a KdeError to a PyErr
fn to_py_error(e: impl Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Parse kernel family from string
fn parse_kernel_family(name: &str) -> PyResult<KernelFamily> {
    match name.to_lowercase().as_str() {
        "gaussian" | "normal" => Ok(KernelFamily::Gaussian),
        "epanechnikov" | "parabolic" => Ok(KernelFamily::Epanechnikov),
        "uniform" | "boxcar" => Ok(KernelFamily::Uniform),
        _ => Err(PyValueError::new_err(format!(
            "Unknown kernel: {}. Valid options: gaussian, epanechnikov, uniform",
            name
        ))),
    }
}

/// Parse normalization from string
fn parse_normalization(name: &str) -> PyResult<Normalization> {
    match name.to_lowercase().as_str() {
        "unit_mass" | "mass" | "density" => Ok(Normalization::UnitMass),
        "peak" | "unnormalized" => Ok(Normalization::Peak),
        _ => Err(PyValueError::new_err(format!(
            "Unknown normalization: {}. Valid options: unit_mass, peak",
            name
        ))),
    }
}

/// Parse accumulation strategy from string
fn parse_strategy(name: &str) -> PyResult<Strategy> {
    match name.to_lowercase().as_str() {
        "tiled" | "tiles" => Ok(Strategy::Tiled),
        "private" | "private_volumes" => Ok(Strategy::PrivateVolumes),
        _ => Err(PyValueError::new_err(format!(
            "Unknown strategy: {}. Valid options: tiled, private_volumes",
            name
        ))),
    }
}

/// Worker pool for an optional core count
fn make_executor(ncores: Option<usize>) -> PyResult<Executor> {
    let parallelism = ncores.map_or(Parallelism::Auto, Parallelism::Threads);
    Executor::new(parallelism, None).map_err(to_py_error)
}

/// View a `(..., n_features)` array as a vector field
fn to_vector_field(vf: &PyReadonlyArrayDyn<'_, f64>) -> PyResult<VectorField> {
    let view = vf.as_array();
    let shape = view.shape();
    if shape.len() < 2 {
        return Err(PyValueError::new_err(
            "vf must have at least one spatial axis and a trailing feature axis",
        ));
    }
    let (spatial, features) = shape.split_at(shape.len() - 1);
    let locations: usize = spatial.iter().product();
    let data: Array2<f64> = view
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((locations, features[0]))
        .map_err(to_py_error)?;
    VectorField::new(spatial.to_vec(), data).map_err(to_py_error)
}

/// Gather `x`, `y` and optional `z` into row-major point coordinates
fn interleave(columns: &[&[f64]]) -> PyResult<Vec<f64>> {
    let n = columns[0].len();
    if columns.iter().any(|c| c.len() != n) {
        return Err(PyValueError::new_err(
            "coordinate arrays must have the same length",
        ));
    }
    let mut coords = Vec::with_capacity(n * columns.len());
    for i in 0..n {
        coords.extend(columns.iter().map(|c| c[i]));
    }
    Ok(coords)
}

// ============================================================================
// Density Accumulation
// ============================================================================

/// Kernel density estimate of one point cloud on a pixel grid.
///
/// Coordinates are in pixel units; cell `i` is centred on `i`. The kernel
/// is unnormalized (peak 1.0 per point).
///
/// Parameters
/// ----------
/// h : float
///     Kernel bandwidth in pixels.
/// x, y : array_like
///     Point coordinates.
/// z : array_like or None
///     Third coordinate; None for a 2D grid.
/// shape : sequence of int
///     Grid shape (2 or 3 entries, matching the coordinates).
/// prune_coeff : float
///     Truncation radius in bandwidths, floored to whole cells. A radius
///     below one cell (including any `prune_coeff <= 0`) disables
///     truncation and every point reaches the whole grid. The box is
///     centred on the point itself, so at fractional coordinates the
///     lower edge cell `int(x) - radius` is outside it.
/// kernel : str, optional
///     Kernel family: "gaussian", "epanechnikov", "uniform" (default: "gaussian").
/// ncores : int, optional
///     Worker threads (default: all available).
///
/// Returns
/// -------
/// tuple
///     `(positions, values)` where `positions` is one list of indices per
///     axis and `values` the non-zero densities.
#[pyfunction]
#[pyo3(signature = (h, x, y, z, shape, prune_coeff, kernel="gaussian", ncores=None))]
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
fn calc_kde(
    h: f64,
    x: PyReadonlyArray1<'_, f64>,
    y: PyReadonlyArray1<'_, f64>,
    z: Option<PyReadonlyArray1<'_, f64>>,
    shape: Vec<usize>,
    prune_coeff: f64,
    kernel: &str,
    ncores: Option<usize>,
) -> PyResult<(Vec<Vec<usize>>, Vec<f64>)> {
    let x_slice = x.as_slice().map_err(to_py_error)?;
    let y_slice = y.as_slice().map_err(to_py_error)?;
    let mut columns = vec![x_slice, y_slice];
    if let Some(z) = z.as_ref() {
        columns.push(z.as_slice().map_err(to_py_error)?);
    }
    if shape.len() != columns.len() {
        return Err(PyValueError::new_err(format!(
            "shape has {} axes but {} coordinate arrays were given",
            shape.len(),
            columns.len()
        )));
    }
    let coords = interleave(&columns)?;
    let categories = vec![0u8; x_slice.len()];

    let truncation = Truncation::whole_cells(h * prune_coeff);
    let spec = KernelSpec::isotropic(parse_kernel_family(kernel)?, h, truncation)
        .map_err(to_py_error)?
        .with_normalization(Normalization::Peak);
    let grid = Grid::unit(shape.clone(), 1).map_err(to_py_error)?;

    let kde = Kde::new()
        .grid(grid)
        .kernel(spec)
        .executor(make_executor(ncores)?)
        .adapter(Batch)
        .build()
        .map_err(to_py_error)?;
    let points = PointSet::new(&coords, shape.len(), &categories).map_err(to_py_error)?;
    let sparse = kde.estimate(&points).map_err(to_py_error)?.to_sparse();

    let mut positions = vec![Vec::with_capacity(sparse.nnz()); shape.len()];
    for (index, _) in sparse.iter() {
        for (axis, &i) in index[1..].iter().enumerate() {
            positions[axis].push(i);
        }
    }
    Ok((positions, sparse.values))
}

/// Dense per-category density volume.
///
/// Parameters
/// ----------
/// coords : ndarray
///     `(n, D)` point coordinates in world units.
/// categories : array_like
///     Category index per point.
/// shape : sequence of int
///     Grid shape.
/// category_count : int
///     Number of categories.
/// bandwidth : sequence of float
///     One bandwidth, or one per axis.
/// origin, spacing : sequence of float, optional
///     Grid placement (default: zeros and ones).
/// weights : array_like, optional
///     Per-point weights (default: 1.0).
/// kernel : str, optional
///     Kernel family (default: "gaussian").
/// normalization : str, optional
///     "unit_mass" or "peak" (default: "unit_mass").
/// tail_mass : float, optional
///     Dropped kernel mass tolerance (default: 1e-6).
/// strategy : str, optional
///     "tiled" or "private_volumes" (default: "tiled").
/// ncores : int, optional
///     Worker threads (default: all available).
///
/// Returns
/// -------
/// ndarray
///     Array of shape `(category_count, *shape)`.
#[pyfunction]
#[pyo3(signature = (
    coords, categories, shape, category_count, bandwidth,
    origin=None,
    spacing=None,
    weights=None,
    kernel="gaussian",
    normalization="unit_mass",
    tail_mass=1e-6,
    strategy="tiled",
    ncores=None
))]
#[allow(clippy::too_many_arguments)]
fn calc_density<'py>(
    py: Python<'py>,
    coords: PyReadonlyArray2<'py, f64>,
    categories: PyReadonlyArray1<'py, i64>,
    shape: Vec<usize>,
    category_count: usize,
    bandwidth: Vec<f64>,
    origin: Option<Vec<f64>>,
    spacing: Option<Vec<f64>>,
    weights: Option<PyReadonlyArray1<'py, f64>>,
    kernel: &str,
    normalization: &str,
    tail_mass: f64,
    strategy: &str,
    ncores: Option<usize>,
) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
    let dims = shape.len();
    let grid = Grid::new(
        origin.unwrap_or_else(|| vec![0.0; dims]),
        spacing.unwrap_or_else(|| vec![1.0; dims]),
        shape,
        category_count,
    )
    .map_err(to_py_error)?;
    let spec = KernelSpec::new(
        parse_kernel_family(kernel)?,
        bandwidth,
        Truncation::TailMass(tail_mass),
    )
    .map_err(to_py_error)?
    .with_normalization(parse_normalization(normalization)?);

    let kde = Kde::new()
        .grid(grid)
        .kernel(spec)
        .strategy(parse_strategy(strategy)?)
        .executor(make_executor(ncores)?)
        .adapter(Batch)
        .build()
        .map_err(to_py_error)?;

    let coords = coords.as_array();
    let labels = categories.as_slice().map_err(to_py_error)?;
    let mut points = PointSet::from_array(&coords, labels).map_err(to_py_error)?;
    let weights_slice = match weights.as_ref() {
        Some(w) => Some(w.as_slice().map_err(to_py_error)?),
        None => None,
    };
    if let Some(w) = weights_slice {
        points = points.with_weights(w).map_err(to_py_error)?;
    }

    let volume = kde.estimate(&points).map_err(to_py_error)?;
    Ok(volume.into_array().into_pyarray(py))
}

// ============================================================================
// Signature Analysis
// ============================================================================

/// Pearson's correlation coefficient of two vectors.
#[pyfunction]
fn corr(a: PyReadonlyArray1<'_, f64>, b: PyReadonlyArray1<'_, f64>) -> PyResult<f64> {
    let a = a.as_slice().map_err(to_py_error)?;
    let b = b.as_slice().map_err(to_py_error)?;
    pearson(a, b).map_err(to_py_error)
}

/// Correlation of a centroid with every vector of a `(..., n_features)` field.
#[pyfunction]
#[pyo3(signature = (vec, vf, ncores=None))]
fn calc_ctmap<'py>(
    py: Python<'py>,
    vec: PyReadonlyArray1<'py, f64>,
    vf: PyReadonlyArrayDyn<'py, f64>,
    ncores: Option<usize>,
) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
    let centroid = vec.as_slice().map_err(to_py_error)?;
    let field = to_vector_field(&vf)?;
    let executor = make_executor(ncores)?;
    let map: ArrayD<f64> = cell_type_map(centroid, &field, &executor).map_err(to_py_error)?;
    Ok(map.into_pyarray(py))
}

/// Correlation of each location with the sum of its neighbours.
///
/// Border locations within `size` of the edge are NaN.
#[pyfunction]
#[pyo3(signature = (vf, ncores=None, size=1))]
fn calc_corrmap<'py>(
    py: Python<'py>,
    vf: PyReadonlyArrayDyn<'py, f64>,
    ncores: Option<usize>,
    size: usize,
) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
    let field = to_vector_field(&vf)?;
    let executor = make_executor(ncores)?;
    let map = local_correlation_map(&field, size, &executor).map_err(to_py_error)?;
    Ok(map.into_pyarray(py))
}

/// Correlation of each location with each neighbour separately.
///
/// The trailing axis has `(2 * size + 1) ** D - 1` entries.
#[pyfunction]
#[pyo3(signature = (vf, ncores=None, size=1))]
fn calc_corrmap_2<'py>(
    py: Python<'py>,
    vf: PyReadonlyArrayDyn<'py, f64>,
    ncores: Option<usize>,
    size: usize,
) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
    let field = to_vector_field(&vf)?;
    let executor = make_executor(ncores)?;
    let map = neighbor_correlations(&field, size, &executor).map_err(to_py_error)?;
    Ok(map.into_pyarray(py))
}

/// Grow a region of correlated locations from `pos`.
///
/// Returns the region as a list of index lists, or an empty list when its
/// size falls outside `[min_pixels, max_pixels]`.
#[pyfunction]
#[pyo3(signature = (pos, vf, r=0.6, min_pixels=10, max_pixels=2000))]
fn flood_fill(
    pos: Vec<usize>,
    vf: PyReadonlyArrayDyn<'_, f64>,
    r: f64,
    min_pixels: usize,
    max_pixels: usize,
) -> PyResult<Vec<Vec<usize>>> {
    let field = to_vector_field(&vf)?;
    let params = FloodFillParams {
        threshold: r,
        min_pixels,
        max_pixels,
    };
    grow_region(&field, &pos, &params).map_err(to_py_error)
}

// ============================================================================
// Module Registration
// ============================================================================

/// fastkde: Multi-threaded kernel density accumulation for Python.
#[pymodule]
fn fastkde(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(calc_kde, m)?)?;
    m.add_function(wrap_pyfunction!(calc_density, m)?)?;
    m.add_function(wrap_pyfunction!(corr, m)?)?;
    m.add_function(wrap_pyfunction!(calc_ctmap, m)?)?;
    m.add_function(wrap_pyfunction!(calc_corrmap, m)?)?;
    m.add_function(wrap_pyfunction!(calc_corrmap_2, m)?)?;
    m.add_function(wrap_pyfunction!(flood_fill, m)?)?;
    Ok(())
}
