use scroll_lattice_core::prelude::*;
use scroll_lattice_navigation::prelude::*;
use scroll_lattice_navigation::render;
use utilities::data_sets::gradient_volume;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn render_oblique(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_oblique");
    for canvas_pad in CANVAS_PADS.iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(canvas_pad),
            canvas_pad,
            |b, &canvas_pad| {
                let pad = CacheWindow::pad_for_canvas(canvas_pad);
                let center = Point3i::fill(pad);
                let voxels = gradient_volume(CacheWindow::window_extent(center, pad));
                let window = CacheWindow::from_voxels(1, center, pad, voxels);
                let transform = Transform::rotation(Axis3::Y, 0.3)
                    .compose(&Transform::rotation(Axis3::X, -0.2))
                    .compose(&Transform::uniform_scale(0.8));
                let size = (2 * canvas_pad as usize + 1, 2 * canvas_pad as usize + 1);

                b.iter(|| black_box(render(&window, &transform, size)));
            },
        );
    }
    group.finish();
}

fn apply_color_window(c: &mut Criterion) {
    let size = 301;
    let raster = Raster::new(size, size, (0..size * size).map(|i| i as u16).collect());
    let color = ColorWindow::default();

    c.bench_function("apply_color_window", |b| {
        b.iter(|| black_box(color.apply(&raster)))
    });
}

criterion_group!(benches, render_oblique, apply_color_window);
criterion_main!(benches);

const CANVAS_PADS: [i32; 2] = [50, 150];
