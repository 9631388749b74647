pub mod config;
pub mod dsp; // Oscillators and pitch estimation
pub mod error;
pub mod graph; // Composable audio graph nodes
pub mod io; // Decoding uploads
pub mod runtime; // Sessions, outputs and the transport
pub mod synth; // Instruments and the tracking voice

pub const MAX_BLOCK_SIZE: usize = 2048;
