use scroll_lattice_core::prelude::*;
use scroll_lattice_storage::prelude::*;
use utilities::data_sets::gradient_volume;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn store_with_level(chunk_edge: i32, volume_edge: i32) -> VolumeStore {
    let mut store = VolumeStore::open(&StoreConfig::temporary()).unwrap();
    store
        .declare_levels(&ResolutionLevel::sequence("scroll", &[1]))
        .unwrap();
    store
        .open_or_create(1, Point3i::fill(volume_edge), Point3i::fill(chunk_edge))
        .unwrap();

    store
}

fn store_write_box(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_write_box");

    for box_chunks in [1, 2, 4].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(box_chunks),
            box_chunks,
            |b, &box_chunks| {
                b.iter_with_setup(
                    || {
                        let chunk_edge = 16;
                        let store = store_with_level(chunk_edge, 4 * chunk_edge);
                        let extent = Extent3i::from_min_and_shape(
                            Point3i::ZERO,
                            Point3i::fill(box_chunks * chunk_edge),
                        );

                        (store, gradient_volume(extent))
                    },
                    |(store, src)| {
                        store.write_box(1, &src).unwrap();
                        store.flush().unwrap();
                    },
                );
            },
        );
    }
    group.finish();
}

fn store_read_box(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_read_box");

    for box_chunks in [1, 2, 4].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(box_chunks),
            box_chunks,
            |b, &box_chunks| {
                let chunk_edge = 16;
                let store = store_with_level(chunk_edge, 4 * chunk_edge);
                let extent =
                    Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(box_chunks * chunk_edge));
                store.write_box(1, &gradient_volume(extent)).unwrap();

                b.iter(|| store.read_box(1, &extent).unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, store_write_box, store_read_box);
criterion_main!(benches);
