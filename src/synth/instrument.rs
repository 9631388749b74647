//! Instrument registry: the fixed mapping from instrument to timbre.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::OscillatorWaveform;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Instrument {
    #[default]
    Piano,
    Guitar,
    Flute,
    Violin,
    Bass,
    Synth,
}

/// Every selectable instrument, in selector order.
pub const INSTRUMENTS: [Instrument; 6] = [
    Instrument::Piano,
    Instrument::Guitar,
    Instrument::Flute,
    Instrument::Violin,
    Instrument::Bass,
    Instrument::Synth,
];

impl Instrument {
    /// Oscillator shape used when a voice is created for this instrument.
    pub fn waveform(self) -> OscillatorWaveform {
        match self {
            Instrument::Piano => OscillatorWaveform::Triangle,
            Instrument::Guitar => OscillatorWaveform::Sawtooth,
            Instrument::Flute => OscillatorWaveform::Sine,
            Instrument::Violin => OscillatorWaveform::Sawtooth,
            Instrument::Bass => OscillatorWaveform::Square,
            Instrument::Synth => OscillatorWaveform::Square,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Instrument::Piano => "piano",
            Instrument::Guitar => "guitar",
            Instrument::Flute => "flute",
            Instrument::Violin => "violin",
            Instrument::Bass => "bass",
            Instrument::Synth => "synth",
        }
    }

    /// Position in [`INSTRUMENTS`].
    pub fn index(self) -> usize {
        INSTRUMENTS
            .iter()
            .position(|&i| i == self)
            .unwrap_or_default()
    }

    /// Next instrument in selector order, wrapping around.
    pub fn next(self) -> Self {
        INSTRUMENTS[(self.index() + 1) % INSTRUMENTS.len()]
    }

    /// Previous instrument in selector order, wrapping around.
    pub fn prev(self) -> Self {
        INSTRUMENTS[(self.index() + INSTRUMENTS.len() - 1) % INSTRUMENTS.len()]
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown instrument `{0}` (expected one of: piano, guitar, flute, violin, bass, synth)")]
pub struct UnknownInstrument(pub String);

impl FromStr for Instrument {
    type Err = UnknownInstrument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        INSTRUMENTS
            .iter()
            .copied()
            .find(|i| i.key() == wanted)
            .ok_or_else(|| UnknownInstrument(s.to_string()))
    }
}
