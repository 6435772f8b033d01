//! Media infrastructure module
//!
//! Fetching of remote, inline and local media, image decoding with the
//! `image` crate, and video decoding through FFmpeg.

mod ffmpeg_video;
mod fetch;
mod loader;

pub use ffmpeg_video::{read_video_info, FfmpegVideoSource, VideoInfo};
pub use fetch::{FetchError, Fetched, MediaFetcher};
pub use loader::FetchingMediaLoader;
