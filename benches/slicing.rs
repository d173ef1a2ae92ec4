use criterion::{criterion_group, criterion_main, Criterion, black_box};

use glam::Vec3;

use voxslice::color::{LayerColoring, LinearColorMap};
use voxslice::slice::{
    Interpolation, Layer, LayerStack, SlicePlane, SliceRenderer, SliceView, ViewSettings,
};
use voxslice::slice::sampler::sample_layer;
use voxslice::volume::{DataKind, IndexTransform, Volume};

fn gradient_volume(size: usize) -> Volume {
    let t = IndexTransform::from_spacing_origin(Vec3::ONE, Vec3::ZERO).unwrap();
    Volume::from_fn("bench", [size; 3], DataKind::PaletteScalar, t, |i, j, k, _| {
        (i + j + k) as f32
    })
    .unwrap()
}

fn bench_sample_layer_128(c: &mut Criterion) {
    let volume = gradient_volume(128);
    let map = LinearColorMap::grayscale(0.0, 384.0);
    let layer = Layer::new(volume.grid(0).unwrap(), LayerColoring::Palette(&map), 1.0);
    let grid = volume.grid(0).unwrap();
    let plane = SlicePlane::for_view(
        SliceView::Axial,
        glam::Mat4::IDENTITY,
        Vec3::splat(64.0),
        &grid.bounds(),
        1.0,
    )
    .unwrap();

    c.bench_function("sample_layer_128", |b| {
        b.iter(|| sample_layer(black_box(&layer), black_box(&plane), Interpolation::Nearest));
    });
}

fn bench_sample_layer_trilinear_128(c: &mut Criterion) {
    let volume = gradient_volume(128);
    let map = LinearColorMap::grayscale(0.0, 384.0);
    let layer = Layer::new(volume.grid(0).unwrap(), LayerColoring::Palette(&map), 1.0);
    let grid = volume.grid(0).unwrap();
    let plane = SlicePlane::for_view(
        SliceView::Axial,
        glam::Mat4::from_rotation_x(0.3),
        Vec3::splat(64.0),
        &grid.bounds(),
        1.0,
    )
    .unwrap();

    c.bench_function("sample_layer_trilinear_128", |b| {
        b.iter(|| sample_layer(black_box(&layer), black_box(&plane), Interpolation::Trilinear));
    });
}

fn bench_draw_single_layer(c: &mut Criterion) {
    let volume = gradient_volume(128);
    let map = LinearColorMap::grayscale(0.0, 384.0);
    let mut stack = LayerStack::new();
    stack.push(Layer::new(volume.grid(0).unwrap(), LayerColoring::Palette(&map), 1.0));
    let renderer = SliceRenderer::new(ViewSettings::orthogonal(SliceView::Axial, Vec3::splat(64.0)));

    c.bench_function("draw_single_layer_128", |b| {
        b.iter(|| renderer.draw(black_box(&stack)));
    });
}

fn bench_draw_three_layers(c: &mut Criterion) {
    let a = gradient_volume(128);
    let b_vol = gradient_volume(128);
    let c_vol = gradient_volume(128);
    let map = LinearColorMap::grayscale(0.0, 384.0);
    let mut stack = LayerStack::new();
    stack.push(Layer::new(a.grid(0).unwrap(), LayerColoring::Palette(&map), 1.0));
    stack.push(Layer::new(b_vol.grid(0).unwrap(), LayerColoring::Palette(&map), 0.5));
    stack.push(Layer::new(c_vol.grid(0).unwrap(), LayerColoring::Palette(&map), 0.5));
    let renderer = SliceRenderer::new(ViewSettings::oblique(
        SliceView::Axial,
        Vec3::splat(64.0),
        [15.0, 0.0, 30.0],
    ));

    c.bench_function("draw_three_layers_oblique_128", |b| {
        b.iter(|| renderer.draw(black_box(&stack)));
    });
}

criterion_group!(
    benches,
    bench_sample_layer_128,
    bench_sample_layer_trilinear_128,
    bench_draw_single_layer,
    bench_draw_three_layers
);
criterion_main!(benches);
