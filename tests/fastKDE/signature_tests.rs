use approx::assert_abs_diff_eq;
use fastKDE::prelude::*;
use ndarray::Array2;

fn executor() -> Executor {
    Executor::new(Parallelism::Threads(2), None).unwrap()
}

/// Two categories on a 20 x 20 grid: left half dominated by category 0,
/// right half by category 1.
fn two_domain_field() -> VectorField {
    let grid = Grid::unit(vec![20, 20], 2).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.5], Truncation::default()).unwrap();
    let kde = Kde::new()
        .grid(grid)
        .kernel(kernel)
        .executor(executor())
        .adapter(Batch)
        .build()
        .unwrap();

    let mut coords = Vec::new();
    let mut cats = Vec::new();
    for x in 0..20 {
        for y in 0..20 {
            coords.extend_from_slice(&[x as f64, y as f64]);
            cats.push(if y < 10 { 0u8 } else { 1 });
        }
    }
    let points = PointSet::new(&coords, 2, &cats).unwrap();
    kde.estimate(&points).unwrap().to_vector_field()
}

#[test]
fn test_pearson_basics() {
    let a = [1.0, 2.0, 3.0, 4.0, 5.0];
    let b = [2.0, 4.0, 6.0, 8.0, 10.0];
    let c = [5.0, 4.0, 3.0, 2.0, 1.0];
    assert_abs_diff_eq!(pearson(&a, &b).unwrap(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(pearson(&a, &c).unwrap(), -1.0, epsilon = 1e-12);
    assert_eq!(pearson(&a, &[3.0; 5]).unwrap(), 0.0);
    assert!(matches!(
        pearson(&a, &b[..4]),
        Err(KdeError::MismatchedInputs { .. })
    ));
}

#[test]
fn test_cell_type_map_separates_domains() {
    let field = two_domain_field();
    let map = cell_type_map(&[1.0, 0.0], &field, &executor()).unwrap();

    assert_eq!(map.shape(), &[20, 20]);
    assert!(map[[10, 2]] > 0.9);
    assert!(map[[10, 17]] < -0.9);
    assert!(cell_type_map(&[1.0, 0.0, 0.0], &field, &executor()).is_err());
}

#[test]
fn test_local_correlation_map() {
    let field = two_domain_field();
    let map = local_correlation_map(&field, 1, &executor()).unwrap();

    assert_eq!(map.shape(), &[20, 20]);
    assert!(map[[0, 5]].is_nan());
    assert!(map[[19, 5]].is_nan());
    assert!(map[[5, 0]].is_nan());
    assert!(map[[10, 3]] > 0.99);
    assert!(map[[10, 16]] > 0.99);
    assert!(map
        .iter()
        .filter(|v| !v.is_nan())
        .all(|&v| (-1.0..=1.0).contains(&v)));

    assert!(matches!(
        local_correlation_map(&field, 0, &executor()),
        Err(KdeError::Configuration(_))
    ));
}

#[test]
fn test_neighbor_correlations_layout() {
    let field = two_domain_field();
    let k = neighborhood_size(2, 1).unwrap();
    assert_eq!(k, 8);

    let all = neighbor_correlations(&field, 1, &executor()).unwrap();
    assert_eq!(all.shape(), &[20, 20, k]);
    assert!(all[[0, 0, 0]].is_nan());
    for n in 0..k {
        assert!(all[[10, 3, n]] > 0.99);
    }
    assert_eq!(neighborhood_size(3, 2).unwrap(), 124);
}

#[test]
fn test_flood_fill_on_density_field() {
    let field = two_domain_field();
    let params = FloodFillParams {
        threshold: 0.6,
        min_pixels: 10,
        max_pixels: 1000,
    };

    let left = flood_fill(&field, &[10, 2], &params).unwrap();
    assert!(!left.is_empty());
    assert_eq!(left[0], vec![10, 2]);
    assert!(left.iter().all(|p| p[1] < 12));
    assert!(left.len() >= 150);

    let capped = FloodFillParams {
        max_pixels: 50,
        ..params
    };
    assert!(flood_fill(&field, &[10, 2], &capped).unwrap().is_empty());
}

#[test]
fn test_flood_fill_defaults() {
    let params = FloodFillParams::default();
    assert_eq!(params.threshold, 0.6);
    assert_eq!(params.min_pixels, 10);
    assert_eq!(params.max_pixels, 2000);

    // An isolated location yields no region.
    let mut data = Array2::<f64>::zeros((25, 3));
    for loc in 0..25 {
        let v = if loc % 2 == 0 { [1.0, 2.0, 3.0] } else { [3.0, 2.0, 1.0] };
        data.row_mut(loc).assign(&ndarray::arr1(&v));
    }
    let field = VectorField::new(vec![5, 5], data).unwrap();
    assert!(flood_fill(&field, &[2, 2], &params).unwrap().is_empty());
}
