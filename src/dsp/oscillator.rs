#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
Phase-Accumulating Oscillator
=============================

Every waveform here is a function of a single number: the phase, which runs
from 0.0 up to (but not including) 1.0 once per cycle.

    phase increment = frequency / sample_rate

At 440 Hz and 48 kHz the increment is 440 / 48000 ≈ 0.00917, so one cycle
takes about 109 samples. Each sample we read the waveform at the current
phase, then advance and wrap.

Retuning only changes the increment, never the phase. A voice that glides
from 220 Hz to 230 Hz therefore stays continuous: no click at the moment the
pitch follower hands it a new frequency.


The Shapes
----------

  Sine       sin(2π·phase)                       fundamental only
  Triangle   piecewise linear, peaks at ±1       odd harmonics, 1/n²
  Square     +1 for the first half, -1 after     odd harmonics, 1/n
  Sawtooth   2·phase - 1                         all harmonics, 1/n

Triangle is aligned with the sine: it starts at 0 and rises, peaks at a
quarter cycle, crosses zero at half a cycle.

These are naive (non band-limited) shapes. Square and sawtooth alias when
their harmonics pass Nyquist, which is audible above a few kHz and
acceptable for a pitch follower that mostly tracks voices and instruments.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OscillatorWaveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

impl OscillatorWaveform {
    /// Evaluate the waveform at `phase` in [0, 1).
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            OscillatorWaveform::Sine => (std::f32::consts::TAU * phase).sin(),
            OscillatorWaveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
            OscillatorWaveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            OscillatorWaveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OscillatorWaveform::Sine => "sine",
            OscillatorWaveform::Triangle => "triangle",
            OscillatorWaveform::Square => "square",
            OscillatorWaveform::Sawtooth => "sawtooth",
        }
    }
}

pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Sawtooth)
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    /// Restart the cycle from phase zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Fill `destination` with the waveform at `frequency` Hz.
    pub fn render(&mut self, destination: &mut [f32], frequency: f32, ctx: &RenderCtx) {
        let increment = if ctx.sample_rate > 0.0 {
            (frequency / ctx.sample_rate).clamp(0.0, 0.5)
        } else {
            0.0
        };

        for sample in destination.iter_mut() {
            *sample = self.waveform.sample(self.phase);
            self.phase += increment;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn render(waveform: OscillatorWaveform, frequency: f32, len: usize) -> Vec<f32> {
        let ctx = RenderCtx::new(SAMPLE_RATE);
        let mut osc = OscillatorBlock::new(waveform);
        let mut buffer = vec![0.0f32; len];
        osc.render(&mut buffer, frequency, &ctx);
        buffer
    }

    #[test]
    fn every_shape_stays_in_unit_range() {
        for waveform in [
            OscillatorWaveform::Sine,
            OscillatorWaveform::Triangle,
            OscillatorWaveform::Square,
            OscillatorWaveform::Sawtooth,
        ] {
            let buffer = render(waveform, 1_000.0, 512);
            assert!(
                buffer.iter().all(|s| (-1.0..=1.0).contains(s)),
                "{} left [-1, 1]",
                waveform.name()
            );
        }
    }

    #[test]
    fn triangle_is_aligned_with_sine() {
        assert_eq!(OscillatorWaveform::Triangle.sample(0.0), 0.0);
        assert!((OscillatorWaveform::Triangle.sample(0.25) - 1.0).abs() < 1e-6);
        assert!(OscillatorWaveform::Triangle.sample(0.5).abs() < 1e-6);
        assert!((OscillatorWaveform::Triangle.sample(0.75) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn square_completes_one_cycle_per_period() {
        // 480 Hz at 48 kHz is exactly 100 samples per cycle
        let buffer = render(OscillatorWaveform::Square, 480.0, 200);
        let rising_edges = buffer
            .windows(2)
            .filter(|pair| pair[0] < 0.0 && pair[1] > 0.0)
            .count();
        assert_eq!(rising_edges, 1);
    }

    #[test]
    fn phase_survives_a_retune() {
        let mut osc = OscillatorBlock::sine();
        let mut first = vec![0.0f32; 37];
        let mut second = vec![0.0f32; 1];
        let ctx = RenderCtx::new(SAMPLE_RATE);
        osc.render(&mut first, 440.0, &ctx);
        osc.render(&mut second, 660.0, &ctx);

        // The next sample continues from the phase 440 Hz left behind
        let expected = (std::f32::consts::TAU * 37.0 * 440.0 / SAMPLE_RATE).sin();
        assert!((second[0] - expected).abs() < 1e-4);
    }
}
