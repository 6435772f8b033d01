//! Encoder adapters

mod ffmpeg;

pub use ffmpeg::{audio_encoder, video_encoder, FfmpegEncoder, FfmpegSession};
