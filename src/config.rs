//! Pipeline configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::synth::instrument::Instrument;

/// Estimates at or below this clarity are ignored.
pub const CLARITY_THRESHOLD: f32 = 0.8;

/// Gain the voice is held at while sounding.
pub const VOICE_GAIN: f32 = 0.5;

/// Default analysis window, in samples.
pub const DEFAULT_WINDOW_SIZE: usize = 2048;

/// Capacity of the voice command ring.
pub const VOICE_QUEUE_SIZE: usize = 64;

const MIN_WINDOW_SIZE: usize = 64;
const MAX_WINDOW_SIZE: usize = 32_768;

/// Per-session settings for the analysis and resynthesis pipeline.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Analysis window length in samples, shared by sampler and estimator
    pub window_size: usize,
    /// Analysis tap capacity, in windows
    pub tap_windows: usize,
    /// Instrument selected when the transport is created
    pub instrument: Instrument,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            tap_windows: 4,
            instrument: Instrument::default(),
        }
    }

    /// Set the analysis window length in samples
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set how many windows the analysis tap can hold between frames
    pub fn tap_windows(mut self, tap_windows: usize) -> Self {
        self.tap_windows = tap_windows;
        self
    }

    /// Set the initially selected instrument
    pub fn instrument(mut self, instrument: Instrument) -> Self {
        self.instrument = instrument;
        self
    }

    /// Ring capacity of the analysis tap, in samples.
    pub fn tap_capacity(&self) -> usize {
        self.window_size * self.tap_windows
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE).contains(&self.window_size) {
            return Err(ConfigError::WindowSize {
                size: self.window_size,
                min: MIN_WINDOW_SIZE,
                max: MAX_WINDOW_SIZE,
            });
        }
        if self.tap_windows < 2 {
            return Err(ConfigError::TapWindows(self.tap_windows));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}
