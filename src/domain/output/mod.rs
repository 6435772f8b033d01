//! Output domain module: encodings, the recorded stream, and the final asset

mod asset;
mod encoding;
mod stream;

pub use asset::{AssetUrl, CompositeAsset, ObjectUrlRegistry};
pub use encoding::{AudioCodec, Container, EncodingFormat, VideoCodec};
pub use stream::{OutputStream, VideoTrack};
