use approx::assert_abs_diff_eq;
use fastKDE::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

struct Cloud {
    coords: Vec<f64>,
    cats: Vec<u16>,
    weights: Vec<f64>,
}

/// Points spread a little past the grid so some footprints are clipped or skipped.
fn cloud(n: usize, shape: &[usize], categories: u16, seed: u64) -> Cloud {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut coords = Vec::with_capacity(n * shape.len());
    for _ in 0..n {
        for &len in shape {
            coords.push(rng.gen_range(-4.0..len as f64 + 4.0));
        }
    }
    let cats = (0..n).map(|_| rng.gen_range(0..categories)).collect();
    let weights = (0..n).map(|_| rng.gen_range(0.1..3.0)).collect();
    Cloud {
        coords,
        cats,
        weights,
    }
}

fn run(
    grid: &Grid,
    kernel: &KernelSpec,
    cloud: &Cloud,
    threads: usize,
    strategy: Strategy,
    tile_rows: Option<usize>,
) -> DensityVolume {
    let mut builder = Kde::new()
        .grid(grid.clone())
        .kernel(kernel.clone())
        .parallelism(Parallelism::Threads(threads))
        .strategy(strategy);
    if let Some(rows) = tile_rows {
        builder = builder.tile_rows(rows);
    }
    let kde = builder.adapter(Batch).build().unwrap();
    let points = PointSet::new(&cloud.coords, grid.dims(), &cloud.cats)
        .unwrap()
        .with_weights(&cloud.weights)
        .unwrap();
    kde.estimate(&points).unwrap()
}

#[test]
fn test_tiled_is_bitwise_reproducible_2d() {
    let grid = Grid::unit(vec![64, 48], 4).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.7], Truncation::default()).unwrap();
    let pts = cloud(5_000, &[64, 48], 4, 7);

    let reference = run(&grid, &kernel, &pts, 1, Strategy::Tiled, None);
    for threads in [2, 3, 8] {
        let other = run(&grid, &kernel, &pts, threads, Strategy::Tiled, None);
        assert_eq!(reference.as_slice(), other.as_slice(), "threads = {threads}");
    }
}

#[test]
fn test_tiled_is_bitwise_reproducible_3d() {
    let grid = Grid::new(vec![0.0; 3], vec![0.5, 0.5, 1.0], vec![24, 20, 12], 2).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0, 1.0, 1.5], Truncation::default()).unwrap();
    let pts = cloud(2_000, &[12, 10, 12], 2, 11);

    let reference = run(&grid, &kernel, &pts, 1, Strategy::Tiled, None);
    for threads in [2, 8] {
        let other = run(&grid, &kernel, &pts, threads, Strategy::Tiled, None);
        assert_eq!(reference.as_slice(), other.as_slice(), "threads = {threads}");
    }
}

#[test]
fn test_tile_height_does_not_change_the_result() {
    let grid = Grid::unit(vec![50, 30], 3).unwrap();
    let kernel = KernelSpec::gaussian(vec![2.0], Truncation::default()).unwrap();
    let pts = cloud(3_000, &[50, 30], 3, 3);

    let reference = run(&grid, &kernel, &pts, 4, Strategy::Tiled, None);
    for rows in [1, 2, 7, 50] {
        let other = run(&grid, &kernel, &pts, 4, Strategy::Tiled, Some(rows));
        assert_eq!(reference.as_slice(), other.as_slice(), "tile_rows = {rows}");
    }
}

#[test]
fn test_private_volumes_match_tiled() {
    let grid = Grid::unit(vec![40, 40], 3).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.3], Truncation::default()).unwrap();
    let pts = cloud(4_000, &[40, 40], 3, 21);

    let tiled = run(&grid, &kernel, &pts, 1, Strategy::Tiled, None);
    let scale = tiled.as_slice().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    for threads in [1, 2, 8] {
        let private = run(&grid, &kernel, &pts, threads, Strategy::PrivateVolumes, None);
        for (a, b) in tiled.as_slice().iter().zip(private.as_slice()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10 * scale);
        }
    }
}

#[test]
fn test_matches_brute_force_reference() {
    let grid = Grid::new(vec![-2.0, 1.0], vec![0.5, 0.25], vec![30, 36], 2).unwrap();
    let kernel = KernelSpec::gaussian(vec![0.8, 0.6], Truncation::default()).unwrap();
    let resolved = kernel.resolve(&grid).unwrap();
    let pts = {
        let mut c = cloud(400, &[15, 9], 2, 5);
        for p in c.coords.chunks_exact_mut(2) {
            p[0] -= 2.0;
            p[1] += 1.0;
        }
        c
    };

    let mut expected = vec![0.0; 2 * 30 * 36];
    for (i, p) in pts.coords.chunks_exact(2).enumerate() {
        let u = (p[0] + 2.0) / 0.5;
        let v = (p[1] - 1.0) / 0.25;
        let base = pts.cats[i] as usize * 30 * 36;
        for x in 0..30 {
            let dx = x as f64 - u;
            if dx.abs() > resolved.radius(0) {
                continue;
            }
            for y in 0..36 {
                let dy = y as f64 - v;
                if dy.abs() > resolved.radius(1) {
                    continue;
                }
                expected[base + x * 36 + y] +=
                    pts.weights[i] * resolved.weight(0, dx) * resolved.weight(1, dy);
            }
        }
    }

    let got = run(&grid, &kernel, &pts, 4, Strategy::Tiled, None);
    for (a, b) in got.as_slice().iter().zip(&expected) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn test_shared_executor() {
    let executor = Executor::new(Parallelism::Threads(3), None).unwrap();
    let grid = Grid::unit(vec![32, 32], 2).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::default()).unwrap();
    let pts = cloud(1_000, &[32, 32], 2, 9);
    let points = PointSet::new(&pts.coords, 2, &pts.cats).unwrap();

    let batch = Kde::new()
        .grid(grid.clone())
        .kernel(kernel.clone())
        .executor(executor.clone())
        .adapter(Batch)
        .build()
        .unwrap();
    let mut incremental = Kde::new()
        .grid(grid)
        .kernel(kernel)
        .executor(executor.clone())
        .adapter(Incremental)
        .build()
        .unwrap();

    let summary = incremental.add_points(&points).unwrap();
    assert_eq!(summary.threads, 3);
    assert_eq!(batch.executor().threads(), 3);
    assert_eq!(
        batch.estimate(&points).unwrap().as_slice(),
        incremental.volume().as_slice()
    );

    let field = incremental.volume().to_vector_field();
    let map = cell_type_map(&[1.0, 0.0], &field, &executor).unwrap();
    assert_eq!(map.shape(), &[32, 32]);
}

#[test]
fn test_max_threads_caps_auto() {
    let grid = Grid::unit(vec![8], 1).unwrap();
    let kernel = KernelSpec::gaussian(vec![1.0], Truncation::default()).unwrap();
    let kde = Kde::new()
        .grid(grid)
        .kernel(kernel)
        .max_threads(1)
        .adapter(Batch)
        .build()
        .unwrap();
    assert_eq!(kde.executor().threads(), 1);
}
