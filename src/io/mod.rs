// Purpose - getting uploaded audio into the pipeline

pub mod decoder;
pub mod source;

pub use decoder::{decode, decode_with_hint};
pub use source::AudioSource;
