//! Composable building blocks for the synthesis side of the playback graph.
//!
//! Graph nodes wrap the low-level DSP primitives with what a live voice
//! needs: start/stop, retuning, and block-based rendering.

/// Constant gain stage.
pub mod gain;
/// Core traits shared by all graph nodes.
pub mod node;
/// Retunable audio-band oscillator.
pub mod oscillator;

pub use gain::Gain;
pub use node::{GraphNode, RenderCtx};
pub use oscillator::OscNode;
