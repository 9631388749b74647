// Purpose: turning accepted pitch estimates into a single live voice
// This layer sits between the pitch estimator and the playback graph

pub mod instrument;
pub mod message;
pub mod voice;

pub use instrument::{Instrument, INSTRUMENTS};
pub use message::VoiceCommand;
pub use voice::{accepted_frequency, VoiceController, VoiceSink, VoiceSnapshot};
