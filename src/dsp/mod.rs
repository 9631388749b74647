//! Low-level DSP primitives used by the graph nodes and the pitch follower.
//!
//! Oscillators are allocation-free and realtime-safe, so they can live inside
//! the audio callback. The pitch estimator allocates its scratch buffers once
//! at construction and reuses them for every analysis window.

/// Oscillator waveforms.
pub mod oscillator;
/// McLeod pitch method (NSDF) fundamental frequency estimation.
pub mod pitch;

pub use oscillator::{OscillatorBlock, OscillatorWaveform};
pub use pitch::{McLeodDetector, PitchEstimate};
