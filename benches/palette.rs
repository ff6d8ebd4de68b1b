use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use facade_ratio_rs::facade_pipeline::{
    ColorReferenceTable, FacadeRatio, PaletteClassifier, RatioCalculator, render_overlay,
};
use image::{Rgb, RgbImage};

/// Mask with red window blocks on a blue facade, a black sky band and some
/// off-palette edge noise, roughly what the mask stage sends back.
fn generate_mock_mask(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if y < height / 5 {
            Rgb([0, 0, 0])
        } else if (x / 16) % 3 == 1 && (y / 24) % 2 == 1 {
            Rgb([250, 12, 8])
        } else if (x + y) % 97 == 0 {
            Rgb([128, 60, 128])
        } else {
            Rgb([6, 10, 245])
        }
    })
}

fn benchmark_classify_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_by_size");

    let sizes = vec![
        (256, 256, "256x256"),
        (1024, 768, "1024x768"),
        (2048, 1536, "2048x1536"),
    ];

    for (width, height, label) in sizes {
        let mask = generate_mock_mask(width, height);
        let classifier = PaletteClassifier::default();

        group.bench_with_input(BenchmarkId::from_parameter(label), &mask, |b, mask| {
            b.iter(|| classifier.classify(black_box(mask)));
        });
    }

    group.finish();
}

fn benchmark_rejection_thresholds(c: &mut Criterion) {
    let mut group = c.benchmark_group("rejection_threshold");
    let mask = generate_mock_mask(1024, 768);

    for threshold in [50.0, 150.0, 300.0] {
        let classifier = PaletteClassifier::new(ColorReferenceTable::with_threshold(threshold));
        group.bench_with_input(BenchmarkId::from_parameter(threshold), &mask, |b, mask| {
            b.iter(|| classifier.classify(black_box(mask)));
        });
    }

    group.finish();
}

fn benchmark_overlay(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay");
    let mask = generate_mock_mask(1024, 768);
    let base = RgbImage::from_pixel(1024, 768, Rgb([120, 120, 120]));

    group.bench_function("render_only", |b| {
        let (_, labels) = PaletteClassifier::default().classify_with_labels(&mask);
        let ratio = FacadeRatio {
            window_ratio: 30.0,
            wall_ratio: 70.0,
        };
        b.iter(|| render_overlay(black_box(&base), &labels, &ratio));
    });

    group.bench_function("classify_and_render", |b| {
        let calculator = RatioCalculator::default();
        b.iter(|| calculator.calculate(black_box(&mask), &base));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_classify_sizes,
    benchmark_rejection_thresholds,
    benchmark_overlay
);
criterion_main!(benches);
