//! Media domain module: sources, decoded audio, and the drawing surface

mod audio_track;
mod canvas;
mod source;

pub use audio_track::AudioTrack;
pub use canvas::Canvas;
pub use source::{DataUri, MediaKind, MediaLocation, MediaOrigin, MediaSource, MediaUrlError};
