//! Benchmarks for low-level DSP primitives.

mod oscillator;
mod pitch;

pub use oscillator::bench_oscillator;
pub use pitch::bench_pitch;
