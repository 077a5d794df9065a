use scroll_lattice_core::prelude::*;
use scroll_lattice_storage::prelude::*;
use scroll_lattice_storage::PointDownsampler;
use utilities::data_sets::gradient_volume;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn area_downsample3(c: &mut Criterion) {
    let mut group = c.benchmark_group("area_downsample3");
    for size in TILE_SIZES.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_with_setup(
                || gradient_volume(Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(size))),
                |src| {
                    black_box(AreaDownsampler.downsample(&src, 2));
                },
            );
        });
    }
    group.finish();
}

fn point_downsample3(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_downsample3");
    for size in TILE_SIZES.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_with_setup(
                || gradient_volume(Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(size))),
                |src| {
                    black_box(PointDownsampler.downsample(&src, 2));
                },
            );
        });
    }
    group.finish();
}

criterion_group!(benches, area_downsample3, point_downsample3);
criterion_main!(benches);

const TILE_SIZES: [i32; 3] = [16, 32, 64];
