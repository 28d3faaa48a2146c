//! Benchmarks for grid construction, packing and queries.
//!
//! Run with: `cargo bench --bench grid`

use cellgrid::{BucketView, SeededRandom, UniformGrid, Vec3};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn scattered_points(count: usize, size: f32) -> Vec<Vec3> {
    let mut rng = SeededRandom::new(17);
    (0..count)
        .map(|_| {
            Vec3::new(
                (rng.random() * 2.0 - 1.0) * size,
                (rng.random() * 2.0 - 1.0) * size,
                (rng.random() * 2.0 - 1.0) * size,
            )
        })
        .collect()
}

fn filled_grid(points: &[Vec3], size: f32, bins: u32) -> UniformGrid {
    let mut grid = UniformGrid::new(size, bins);
    for (i, &p) in points.iter().enumerate() {
        grid.insert(p, 0.0, i as u32);
    }
    grid
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_build");

    for count in [1_000, 10_000, 50_000] {
        let points = scattered_points(count, 10.0);
        group.bench_with_input(BenchmarkId::new("insert", count), &points, |b, points| {
            b.iter(|| black_box(filled_grid(points, 10.0, 20)))
        });

        let grid = filled_grid(&points, 10.0, 20);
        group.bench_with_input(BenchmarkId::new("pack", count), &grid, |b, grid| {
            b.iter(|| black_box(grid.pack()))
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_query");
    let points = scattered_points(10_000, 10.0);
    let grid = filled_grid(&points, 10.0, 20);
    let packed = grid.pack();
    let probes = scattered_points(256, 10.0);

    for radius in [0.5f32, 1.0, 2.0] {
        group.bench_with_input(BenchmarkId::new("uniform", radius), &radius, |b, &radius| {
            b.iter(|| {
                for &p in &probes {
                    black_box(grid.query(p, radius));
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("packed", radius), &radius, |b, &radius| {
            b.iter(|| {
                for &p in &probes {
                    black_box(packed.query(p, radius));
                }
            })
        });
    }

    let batch: Vec<(Vec3, f32)> = probes.iter().map(|&p| (p, 1.0)).collect();
    group.bench_function("packed_batch", |b| b.iter(|| black_box(packed.query_batch(&batch))));

    group.bench_function("ray_walk", |b| {
        b.iter(|| {
            let mut visited = 0usize;
            grid.traverse_ray(Vec3::splat(-12.0), Vec3::ONE, |ids, _| {
                visited += ids.len();
                true
            });
            black_box(visited)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_query);
criterion_main!(benches);
