use approx::{assert_abs_diff_eq, assert_relative_eq};
use fastKDE::prelude::*;
use ndarray::{Array1, Array2};

const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

fn batch(grid: Grid, kernel: KernelSpec) -> BatchKde {
    Kde::new()
        .grid(grid)
        .kernel(kernel)
        .parallelism(Parallelism::Threads(2))
        .adapter(Batch)
        .build()
        .unwrap()
}

#[test]
fn test_single_point_1d_profile() {
    let grid = Grid::new(vec![0.0], vec![1.0], vec![10], 1).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::Cells(3.0)).unwrap();
    let kde = batch(grid, kernel);

    let coords = vec![5.0];
    let cats = vec![0u8];
    let points = PointSet::new(&coords, 1, &cats).unwrap();
    let volume = kde.estimate(&points).unwrap();
    let v = volume.as_slice();

    assert_eq!(volume.shape(), &[1, 10]);
    assert_abs_diff_eq!(v[5], FRAC_1_SQRT_2PI, epsilon = 1e-12);
    for d in 1..=3 {
        assert_abs_diff_eq!(v[5 - d], v[5 + d], epsilon = 1e-15);
    }
    for (i, &value) in v.iter().enumerate() {
        if !(2..=8).contains(&i) {
            assert_eq!(value, 0.0, "cell {i} should be untouched");
        }
    }
    assert_abs_diff_eq!(volume.sum(), 1.0, epsilon = 1e-3);
}

#[test]
fn test_mass_conservation_2d() {
    let grid = Grid::unit(vec![40, 40], 1).unwrap();
    let kernel = KernelSpec::gaussian(vec![2.0], Truncation::default()).unwrap();
    let retained = kernel.retained_mass(&grid).unwrap();
    assert!(retained >= 1.0 - 1.1e-6);

    let kde = batch(grid, kernel);
    let coords = vec![20.3, 19.7];
    let weights = vec![2.5];
    let cats = vec![0u32];
    let points = PointSet::new(&coords, 2, &cats)
        .unwrap()
        .with_weights(&weights)
        .unwrap();

    let volume = kde.estimate(&points).unwrap();
    assert_relative_eq!(volume.sum(), 2.5, max_relative = 1e-5);
}

#[test]
fn test_anisotropic_bandwidth_and_spacing() {
    let grid = Grid::new(vec![-5.0, 0.0], vec![0.25, 0.5], vec![41, 41], 1).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0, 2.0], Truncation::default()).unwrap();
    let kde = batch(grid, kernel);

    // World (0, 10) is cell (20, 20).
    let coords = vec![0.0, 10.0];
    let cats = vec![0u8];
    let points = PointSet::new(&coords, 2, &cats).unwrap();
    let volume = kde.estimate(&points).unwrap();

    // Both axes are 4 cells wide in standardized units.
    assert_relative_eq!(volume.sum(), 1.0, max_relative = 1e-4);
    assert_relative_eq!(
        volume.get(0, &[20, 20]).unwrap(),
        FRAC_1_SQRT_2PI * FRAC_1_SQRT_2PI / 16.0,
        max_relative = 1e-12
    );
}

#[test]
fn test_superposition() {
    let grid = Grid::unit(vec![24, 18], 2).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.5], Truncation::default()).unwrap();
    let kde = batch(grid, kernel);

    let a_coords = vec![3.0, 4.0, 10.5, 9.25, 20.0, 1.0];
    let a_cats = vec![0u8, 1, 0];
    let b_coords = vec![11.0, 9.0, 0.5, 17.5];
    let b_cats = vec![1u8, 1];
    let all_coords: Vec<f64> = a_coords.iter().chain(&b_coords).copied().collect();
    let all_cats: Vec<u8> = a_cats.iter().chain(&b_cats).copied().collect();

    let mut split = kde.estimate(&PointSet::new(&a_coords, 2, &a_cats).unwrap()).unwrap();
    kde.accumulate(&PointSet::new(&b_coords, 2, &b_cats).unwrap(), &mut split)
        .unwrap();
    let joint = kde
        .estimate(&PointSet::new(&all_coords, 2, &all_cats).unwrap())
        .unwrap();

    for (x, y) in split.as_slice().iter().zip(joint.as_slice()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-12);
    }
}

#[test]
fn test_boundary_behaviour() {
    let grid = Grid::unit(vec![30, 30], 1).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::Cells(4.0)).unwrap();
    let kde = batch(grid, kernel);
    let cats = vec![0u8];

    let full = kde
        .estimate(&PointSet::new(&[15.0, 15.0][..], 2, &cats).unwrap())
        .unwrap()
        .sum();
    let edge = kde
        .estimate(&PointSet::new(&[0.0, 15.0][..], 2, &cats).unwrap())
        .unwrap()
        .sum();
    assert!(edge > 0.0);
    assert!(edge < full);

    let mut volume = DensityVolume::zeros(kde.grid());
    let outside = [-10.0, 15.0, 15.0, 40.0];
    let two = [0u8, 0];
    let summary = kde
        .accumulate(&PointSet::new(&outside[..], 2, &two).unwrap(), &mut volume)
        .unwrap();
    assert_eq!(summary.points, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(volume.sum(), 0.0);
}

#[test]
fn test_category_isolation() {
    let grid = Grid::unit(vec![16, 16], 3).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::default()).unwrap();
    let kde = batch(grid, kernel);

    let coords = vec![4.0, 4.0, 12.0, 12.0];
    let cats = vec![2u16, 2];
    let volume = kde
        .estimate(&PointSet::new(&coords, 2, &cats).unwrap())
        .unwrap();

    assert_eq!(volume.channel_sum(0).unwrap(), 0.0);
    assert_eq!(volume.channel_sum(1).unwrap(), 0.0);
    assert!(volume.channel_sum(2).unwrap() > 1.9);
    assert!(volume.channel(3).is_none());
}

#[test]
fn test_invalid_category_leaves_volume_unchanged() {
    let grid = Grid::unit(vec![12, 12], 3).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::default()).unwrap();
    let kde = batch(grid, kernel);

    let good_coords = [6.0, 6.0];
    let good_cats = [1u8];
    let good = PointSet::new(&good_coords[..], 2, &good_cats[..]).unwrap();
    let mut volume = kde.estimate(&good).unwrap();
    let before = volume.clone();

    let coords = vec![2.0, 2.0, 5.0, 5.0, 8.0, 8.0];
    let cats = vec![0u8, 5, 2];
    let bad = PointSet::new(&coords, 2, &cats).unwrap();
    let err = kde.accumulate(&bad, &mut volume).unwrap_err();

    match err {
        KdeError::InvalidCategory {
            index,
            category,
            category_count,
        } => {
            assert_eq!(index, 1);
            assert_eq!(category, "5");
            assert_eq!(category_count, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(volume, before);
}

#[test]
fn test_other_contract_errors() {
    let grid = Grid::unit(vec![8, 8], 2).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::default()).unwrap();
    let kde = batch(grid, kernel);

    let xy = [1.0, 1.0];
    let zero = [0u8];
    let minus_one = [-1i32];
    let negative = PointSet::new(&xy[..], 2, &minus_one[..]).unwrap();
    assert!(matches!(
        kde.estimate(&negative),
        Err(KdeError::InvalidCategory { .. })
    ));

    let xyz = [1.0, 1.0, 1.0];
    let three_d = PointSet::new(&xyz[..], 3, &zero[..]).unwrap();
    assert!(matches!(
        kde.estimate(&three_d),
        Err(KdeError::DimensionMismatch {
            expected: 2,
            found: 3
        })
    ));

    let weights = [-1.0];
    let weighted = PointSet::new(&xy[..], 2, &zero[..])
        .unwrap()
        .with_weights(&weights[..])
        .unwrap();
    assert!(matches!(
        kde.estimate(&weighted),
        Err(KdeError::InvalidWeight { index: 0 })
    ));

    let nan_xy = [f64::NAN, 1.0];
    let nan = PointSet::new(&nan_xy[..], 2, &zero[..]).unwrap();
    assert!(matches!(kde.estimate(&nan), Err(KdeError::InvalidInput(_))));

    let other_grid = Grid::unit(vec![8, 9], 2).unwrap();
    let mut wrong = DensityVolume::zeros(&other_grid);
    let ok = PointSet::new(&xy[..], 2, &zero[..]).unwrap();
    assert!(matches!(
        kde.accumulate(&ok, &mut wrong),
        Err(KdeError::ShapeMismatch { .. })
    ));

    assert!(matches!(
        PointSet::new(&[1.0, 1.0, 2.0][..], 2, &[0u8, 1][..]),
        Err(KdeError::MismatchedInputs { .. })
    ));
}

#[test]
fn test_builder_requires_grid_and_kernel() {
    let grid = Grid::unit(vec![8], 1).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::default()).unwrap();

    assert!(Kde::new().kernel(kernel.clone()).adapter(Batch).build().is_err());
    assert!(Kde::new().grid(grid.clone()).adapter(Batch).build().is_err());
    assert!(Kde::new()
        .grid(grid.clone())
        .kernel(kernel.clone())
        .parallelism(Parallelism::Threads(0))
        .adapter(Batch)
        .build()
        .is_err());

    let mismatched = KernelSpec::gaussian(vec![1.0, 2.0], Truncation::default()).unwrap();
    assert!(Kde::new()
        .grid(grid.clone())
        .kernel(mismatched)
        .adapter(Batch)
        .build()
        .is_err());

    let strict = KernelSpec::gaussian(vec![1.0], Truncation::Cells(1.0))
        .unwrap()
        .with_max_tail_mass(1e-6)
        .unwrap();
    assert!(matches!(
        Kde::new().grid(grid).kernel(strict).adapter(Batch).build(),
        Err(KdeError::Configuration(_))
    ));
}

#[test]
fn test_peak_normalization() {
    let grid = Grid::unit(vec![11, 11], 1).unwrap();
    let kernel = KernelSpec::gaussian(vec![2.0], Truncation::default())
        .unwrap()
        .with_normalization(Normalization::Peak);
    let kde = batch(grid, kernel);

    let volume = kde
        .estimate(&PointSet::new(&[5.0, 5.0][..], 2, &[0u8][..]).unwrap())
        .unwrap();
    assert_abs_diff_eq!(volume.get(0, &[5, 5]).unwrap(), 1.0, epsilon = 1e-12);
    assert!(volume.get(0, &[5, 6]).unwrap() < 1.0);
}

#[test]
fn test_whole_cell_truncation() {
    let grid = Grid::unit(vec![12], 1).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::whole_cells(3.5))
        .unwrap()
        .with_normalization(Normalization::Peak);
    let kde = batch(grid, kernel);

    let volume = kde
        .estimate(&PointSet::new(&[5.7][..], 1, &[0u8][..]).unwrap())
        .unwrap();
    let v = volume.as_slice();
    for (i, &value) in v.iter().enumerate() {
        if (3..=8).contains(&i) {
            assert!(value > 0.0, "cell {i} should be covered");
        } else {
            assert_eq!(value, 0.0, "cell {i} should be untouched");
        }
    }
    assert_abs_diff_eq!(v[6], (-0.045f64).exp(), epsilon = 1e-12);
}

#[test]
fn test_unbounded_truncation_reaches_whole_grid() {
    let grid = Grid::unit(vec![40], 2).unwrap();
    let kernel = KernelSpec::gaussian(vec![4.0], Truncation::whole_cells(0.0))
        .unwrap()
        .with_normalization(Normalization::Peak);
    let kde = batch(grid, kernel);

    let coords = vec![2.0, -30.0];
    let cats = vec![0u8, 1];
    let points = PointSet::new(&coords, 1, &cats).unwrap();
    let mut volume = DensityVolume::zeros(kde.grid());
    let summary = kde.accumulate(&points, &mut volume).unwrap();

    assert_eq!(summary.skipped, 0);
    assert_abs_diff_eq!(volume.get(0, &[2]).unwrap(), 1.0, epsilon = 1e-12);
    let far = volume.get(0, &[39]).unwrap();
    assert!(far > 0.0);
    assert_relative_eq!(far, (-(37.0f64 * 37.0) / 32.0).exp(), max_relative = 1e-9);
    assert!(volume.get(1, &[0]).unwrap() > 0.0);
}

#[test]
fn test_compact_kernel_support() {
    let grid = Grid::unit(vec![20], 1).unwrap();
    let kernel =
        KernelSpec::isotropic(KernelFamily::Epanechnikov, 3.0, Truncation::default()).unwrap();
    let kde = batch(grid, kernel);

    let volume = kde
        .estimate(&PointSet::new(&[10.0][..], 1, &[0u8][..]).unwrap())
        .unwrap();
    let v = volume.as_slice();
    assert!(v[8] > 0.0 && v[12] > 0.0);
    for (i, &value) in v.iter().enumerate() {
        if !(7..=13).contains(&i) {
            assert_eq!(value, 0.0);
        }
    }
}

#[test]
fn test_3d_volume() {
    let grid = Grid::unit(vec![14, 12, 10], 2).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::default()).unwrap();
    let kde = batch(grid, kernel);

    let coords = vec![7.0, 6.0, 5.0, 7.2, 5.8, 4.9];
    let cats = vec![0u8, 1];
    let volume = kde
        .estimate(&PointSet::new(&coords, 3, &cats).unwrap())
        .unwrap();

    assert_eq!(volume.shape(), &[2, 14, 12, 10]);
    assert_relative_eq!(volume.channel_sum(0).unwrap(), 1.0, max_relative = 1e-5);
    assert_abs_diff_eq!(
        volume.get(0, &[7, 6, 5]).unwrap(),
        FRAC_1_SQRT_2PI.powi(3),
        epsilon = 1e-12
    );
}

#[test]
fn test_incremental_matches_batch() {
    let grid = Grid::unit(vec![20, 20], 2).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.2], Truncation::default()).unwrap();

    let mut inc = Kde::new()
        .grid(grid.clone())
        .kernel(kernel.clone())
        .adapter(Incremental)
        .build()
        .unwrap();
    assert_eq!(inc.executor().threads(), 1);

    let a = vec![5.0, 5.0, 10.0, 12.0];
    let b = vec![15.5, 3.5];
    inc.add_points(&PointSet::new(&a, 2, &[0u8, 1][..]).unwrap())
        .unwrap();
    inc.add_points(&PointSet::new(&b, 2, &[1u8][..]).unwrap())
        .unwrap();

    // A rejected batch changes nothing.
    let before = inc.volume().clone();
    assert!(inc
        .add_points(&PointSet::new(&b, 2, &[7u8][..]).unwrap())
        .is_err());
    assert_eq!(inc.volume(), &before);
    assert_eq!(inc.points_added(), 3);
    assert_eq!(inc.batches(), 2);

    let all = vec![5.0, 5.0, 10.0, 12.0, 15.5, 3.5];
    let reference = batch(grid, kernel)
        .estimate(&PointSet::new(&all, 2, &[0u8, 1, 1][..]).unwrap())
        .unwrap();
    for (x, y) in inc.volume().as_slice().iter().zip(reference.as_slice()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-12);
    }

    inc.reset();
    assert_eq!(inc.volume().sum(), 0.0);
    assert_eq!(inc.points_added(), 0);

    inc.add_points(&PointSet::new(&b, 2, &[0u8][..]).unwrap())
        .unwrap();
    let volume = inc.finish();
    assert!(volume.channel_sum(0).unwrap() > 0.99);
}

#[test]
fn test_f32_and_ndarray_inputs() {
    let grid = Grid::unit(vec![16, 16], 2).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::default()).unwrap();
    let kde = batch(grid, kernel);

    let coords32 = vec![8.0f32, 8.0, 3.5, 12.25];
    let cats16 = vec![0u16, 1];
    let from_f32 = kde
        .estimate(&PointSet::new(&coords32, 2, &cats16).unwrap())
        .unwrap();

    let coords = Array2::from_shape_vec((2, 2), vec![8.0, 8.0, 3.5, 12.25]).unwrap();
    let cats = Array1::from_vec(vec![0i64, 1]);
    let from_array = kde
        .estimate(&PointSet::from_array(&coords, &cats).unwrap())
        .unwrap();

    for (x, y) in from_f32.as_slice().iter().zip(from_array.as_slice()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-12);
    }

    let transposed = coords.t();
    assert!(PointSet::from_array(&transposed, &cats).is_err());
}

#[test]
fn test_volume_exports() {
    let grid = Grid::unit(vec![10, 10], 2).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::Cells(1.0)).unwrap();
    let kde = batch(grid, kernel);

    let volume = kde
        .estimate(&PointSet::new(&[4.0, 4.0][..], 2, &[1u8][..]).unwrap())
        .unwrap();

    let sparse = volume.to_sparse();
    assert_eq!(sparse.nnz(), 9);
    assert!(sparse.iter().all(|(idx, v)| idx[0] == 1 && v > 0.0));

    let field = volume.to_vector_field();
    assert_eq!(field.n_locations(), 100);
    assert_eq!(field.n_features(), 2);
    let center = field.location(&[4, 4]).unwrap();
    assert_eq!(field.vector(center)[0], 0.0);
    assert_eq!(field.vector(center)[1], volume.get(1, &[4, 4]).unwrap());
}
