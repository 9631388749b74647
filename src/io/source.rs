use std::time::Duration;

use crate::error::DecodeError;

/// Decoded audio: one sample array per channel plus a sample rate.
///
/// Immutable once built. The transport owns it for the lifetime of one
/// playback session.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioSource {
    /// Build a source from per-channel samples.
    ///
    /// Channels are truncated to the shortest one so every frame is complete.
    pub fn new(mut channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, DecodeError> {
        if sample_rate == 0 {
            return Err(DecodeError::UnknownSampleRate);
        }
        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        if frames == 0 {
            return Err(DecodeError::NoSamples);
        }
        for channel in &mut channels {
            channel.truncate(frames);
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, DecodeError> {
        Self::new(vec![samples], sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Average of all channels, the signal the analysis tap observes.
    pub fn mixdown(&self) -> Vec<f32> {
        if let [mono] = self.channels.as_slice() {
            return mono.clone();
        }
        let scale = 1.0 / self.channels.len() as f32;
        (0..self.frames())
            .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() * scale)
            .collect()
    }

    /// Linear-interpolated copy at `target_rate`.
    pub fn resampled(&self, target_rate: u32) -> Self {
        if target_rate == self.sample_rate || target_rate == 0 {
            return self.clone();
        }
        let channels = self
            .channels
            .iter()
            .map(|c| resample_linear(c, self.sample_rate, target_rate))
            .collect();
        Self {
            channels,
            sample_rate: target_rate,
        }
    }
}

fn resample_linear(input: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = ((input.len() as f64 * ratio).round() as usize).max(1);
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        // fractional position in the source buffer
        let src_pos = i as f64 / ratio;
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;
        if idx + 1 >= input.len() {
            out.push(input.last().copied().unwrap_or(0.0));
        } else {
            out.push(input[idx] * (1.0 - frac) + input[idx + 1] * frac);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_frames_over_rate() {
        let source = AudioSource::from_mono(vec![0.0; 22_050], 44_100).unwrap();
        assert_eq!(source.duration(), Duration::from_millis(500));
        assert_eq!(source.channel_count(), 1);
    }

    #[test]
    fn empty_or_rateless_sources_are_rejected() {
        assert!(matches!(
            AudioSource::from_mono(Vec::new(), 44_100),
            Err(DecodeError::NoSamples)
        ));
        assert!(matches!(
            AudioSource::from_mono(vec![0.0; 4], 0),
            Err(DecodeError::UnknownSampleRate)
        ));
    }

    #[test]
    fn ragged_channels_are_truncated() {
        let source = AudioSource::new(vec![vec![1.0; 10], vec![1.0; 7]], 8_000).unwrap();
        assert_eq!(source.frames(), 7);
        assert_eq!(source.channel(1).unwrap().len(), 7);
    }

    #[test]
    fn mixdown_averages_channels() {
        let source = AudioSource::new(vec![vec![1.0, 0.5], vec![0.0, -0.5]], 8_000).unwrap();
        assert_eq!(source.mixdown(), vec![0.5, 0.0]);
    }

    #[test]
    fn resampling_keeps_duration() {
        let ramp = (0..48_000).map(|i| i as f32).collect();
        let source = AudioSource::from_mono(ramp, 48_000).unwrap();
        let resampled = source.resampled(44_100);
        assert_eq!(resampled.sample_rate(), 44_100);
        assert_eq!(resampled.frames(), 44_100);

        // A ramp stays a ramp after linear interpolation
        let ramp = resampled.channel(0).unwrap();
        let expected = 100.0 * 48_000.0 / 44_100.0;
        assert!((ramp[100] - expected).abs() < 1e-2);
    }
}
