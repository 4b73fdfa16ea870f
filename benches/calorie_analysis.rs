use calorie_scan::{CalorieEstimator, CalorieScanner, FoodDetector, ImageProcessor, PortionSize};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use opencv::{
    core::{Mat, Rect, Scalar, CV_8UC3},
    imgproc,
};

/// White 800x600 plate with a green and a red block
fn sample_plate() -> Mat {
    let mut image = Mat::new_rows_cols_with_default(600, 800, CV_8UC3, Scalar::all(255.0)).unwrap();
    for (rect, bgr) in [
        (Rect::new(100, 100, 250, 150), Scalar::new(34.0, 139.0, 34.0, 0.0)),
        (Rect::new(450, 300, 120, 120), Scalar::new(0.0, 69.0, 255.0, 0.0)),
    ] {
        imgproc::rectangle(&mut image, rect, bgr, -1, imgproc::LINE_8, 0).unwrap();
    }
    image
}

fn benchmark_pipeline(c: &mut Criterion) {
    let image = sample_plate();
    let processor = ImageProcessor::new();
    let detector = FoodDetector::new();
    let scanner = CalorieScanner::new();
    let processed = processor.preprocess(&image);

    c.bench_function("preprocess_800x600", |b| {
        b.iter(|| processor.preprocess(black_box(&image)))
    });

    c.bench_function("detect_food_800x600", |b| {
        b.iter(|| detector.detect_food(black_box(&processed)))
    });

    c.bench_function("analyze_800x600", |b| {
        b.iter(|| scanner.analyze(black_box(&image)).unwrap())
    });
}

fn benchmark_estimation(c: &mut Criterion) {
    let estimator = CalorieEstimator::new();

    c.bench_function("estimate_exact_match", |b| {
        b.iter(|| estimator.estimate_calories(black_box("broccoli"), 0.8, PortionSize::Large))
    });

    c.bench_function("estimate_keyword_match", |b| {
        b.iter(|| estimator.estimate_calories(black_box("grilled chicken breast"), 0.8, PortionSize::Medium))
    });
}

criterion_group!(benches, benchmark_pipeline, benchmark_estimation);
criterion_main!(benches);
