//! Benchmarks for one session's playback graph.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use retimbre::{
    config::PipelineConfig,
    io::AudioSource,
    runtime::PlaybackGraph,
    synth::{Instrument, VoiceController},
};

use crate::BLOCK_SIZES;

pub fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/graph");
    let rate = 48_000;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let samples: Vec<f32> = (0..rate * 10).map(|i| (i as f32 * 0.03).sin() * 0.5).collect();
        let Ok(source) = AudioSource::from_mono(samples, rate as u32) else {
            continue;
        };

        // Source only, no voice yet
        let (mut graph, mut ends) =
            PlaybackGraph::new(&source, rate as u32, &PipelineConfig::new());
        group.bench_with_input(BenchmarkId::new("source_only", size), &size, |b, _| {
            b.iter(|| {
                graph.render(black_box(&mut buffer));
                ends.sampler.capture_window();
            })
        });

        // Source plus a sawtooth voice being retuned every block
        let (mut graph, ends) = PlaybackGraph::new(&source, rate as u32, &PipelineConfig::new());
        let mut sampler = ends.sampler;
        let mut voices = VoiceController::new(ends.voice, Instrument::Guitar);
        let mut hz = 220.0;
        group.bench_with_input(BenchmarkId::new("with_voice", size), &size, |b, _| {
            b.iter(|| {
                hz = if hz > 440.0 { 220.0 } else { hz * 1.001 };
                voices.on_accepted(hz);
                graph.render(black_box(&mut buffer));
                sampler.capture_window();
            })
        });
    }

    group.finish();
}
