//! Error types for decoding, output and configuration.

use thiserror::Error;

/// The uploaded bytes could not be turned into audio.
///
/// Recoverable: the transport returns to idle and waits for another upload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("file is empty")]
    Empty,
    #[error("unrecognized or unsupported audio format: {0}")]
    Unsupported(String),
    #[error("no decodable audio track")]
    NoTrack,
    #[error("stream does not declare a sample rate")]
    UnknownSampleRate,
    #[error("corrupt audio stream: {0}")]
    Corrupt(String),
    #[error("audio stream contains no samples")]
    NoSamples,
}

/// The playback graph could not be built or started.
///
/// Fatal to the current session only.
#[derive(Debug, Clone, Error)]
pub enum PlaybackGraphError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("output device configuration failed: {0}")]
    DeviceConfig(String),
    #[error("unsupported output sample format {0} (only f32 is supported)")]
    UnsupportedFormat(String),
    #[error("failed to build output stream: {0}")]
    BuildStream(String),
    #[error("failed to start output stream: {0}")]
    Play(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("analysis window of {size} samples is outside {min}..={max}")]
    WindowSize { size: usize, min: usize, max: usize },
    #[error("analysis tap must hold at least 2 windows, got {0}")]
    TapWindows(usize),
}

/// Why an upload or a preview did not reach the playing state.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Playback(#[from] PlaybackGraphError),
    #[error("preview {0} is no longer available")]
    PreviewRevoked(String),
}
