//! Session runtime: playback graph, audio outputs, previews and the transport.
//!
//! # Example
//!
//! ```ignore
//! use retimbre::{config::PipelineConfig, runtime::*};
//!
//! fn main() -> color_eyre::Result<()> {
//!     let mut transport = TransportController::new(CpalOutput::new()?, PipelineConfig::new())?;
//!     transport.upload(Upload::from_path("voice.wav")?)?;
//!     while transport.tick() == FrameOutcome::Continued {
//!         std::thread::sleep(std::time::Duration::from_millis(16));
//!     }
//!     Ok(())
//! }
//! ```

pub mod graph;
pub mod output;
pub mod preview;
pub mod sampler;
pub mod transport;

pub use graph::{GraphEndpoints, PlaybackGraph, SourceStatus, VoiceLink};
pub use output::{AudioOutput, CpalOutput, HeadlessOutput, StreamHandle};
pub use preview::{PreviewPlayer, PreviewStore, PreviewUrl};
pub use sampler::FrameSampler;
pub use transport::{FrameOutcome, SessionState, SourceInfo, TransportController, Upload};
