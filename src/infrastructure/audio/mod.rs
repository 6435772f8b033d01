//! Audio adapters: decoding, FLAC encoding and playback contexts

mod context;
mod decoder;
mod flac;

pub use context::{RodioAudioContext, RodioAudioContextFactory};
pub use decoder::{decode_audio, RodioAudioPreparer};
pub use flac::{encode_to_flac, encode_track, FlacError};
