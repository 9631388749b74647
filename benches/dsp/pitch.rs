//! Benchmarks for McLeod pitch estimation.

use std::f32::consts::TAU;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use retimbre::dsp::pitch::McLeodDetector;

/// Analysis window sizes worth comparing; 2048 is the default.
const WINDOW_SIZES: &[usize] = &[1024, 2048, 4096];

pub fn bench_pitch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/pitch");
    let sample_rate = 48_000.0;

    for &size in WINDOW_SIZES {
        let voiced: Vec<f32> = (0..size)
            .map(|n| {
                let t = n as f32 / sample_rate;
                0.6 * (TAU * 220.0 * t).sin() + 0.3 * (TAU * 440.0 * t).sin()
            })
            .collect();
        let silence = vec![0.0f32; size];

        let mut detector = McLeodDetector::new(size);
        group.bench_with_input(BenchmarkId::new("voiced", size), &size, |b, _| {
            b.iter(|| detector.estimate(black_box(&voiced), black_box(sample_rate)))
        });

        // Silence exits before the FFT
        let mut detector = McLeodDetector::new(size);
        group.bench_with_input(BenchmarkId::new("silence", size), &size, |b, _| {
            b.iter(|| detector.estimate(black_box(&silence), black_box(sample_rate)))
        });
    }

    group.finish();
}
