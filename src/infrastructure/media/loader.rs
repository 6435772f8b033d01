//! Media loader adapter: fetch, then decode with `image` or FFmpeg

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{LoadedImage, MediaLoadError, MediaLoader, VideoSource};
use crate::domain::composition::Dimensions;
use crate::domain::media::{MediaKind, MediaLocation, MediaOrigin, MediaSource};

use super::fetch::MediaFetcher;
use super::ffmpeg_video::FfmpegVideoSource;

/// Loads images in memory and opens videos through FFmpeg
pub struct FetchingMediaLoader {
    fetcher: MediaFetcher,
    ffmpeg: String,
    ffprobe: String,
}

impl FetchingMediaLoader {
    pub fn new(fetcher: MediaFetcher) -> Self {
        Self {
            fetcher,
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }

    /// Use custom FFmpeg binaries for video
    pub fn with_ffmpeg(mut self, ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self.ffprobe = ffprobe.into();
        self
    }

    /// Decode image bytes into RGBA
    fn decode_image(origin: MediaOrigin, bytes: &[u8]) -> Result<LoadedImage, MediaLoadError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| MediaLoadError::Decode(e.to_string()))?
            .to_rgba8();
        let dimensions = Dimensions::new(decoded.width(), decoded.height())
            .map_err(|e| MediaLoadError::Decode(e.to_string()))?;
        Ok(LoadedImage::new(
            MediaSource::new(origin, dimensions, MediaKind::Image),
            decoded,
        ))
    }
}

#[async_trait]
impl MediaLoader for FetchingMediaLoader {
    async fn load_image(&self, url: &str) -> Result<LoadedImage, MediaLoadError> {
        let location = parse_location(url)?;
        let origin = location.origin();
        let fetched = self.fetcher.fetch_location(location).await?;

        let image = tokio::task::spawn_blocking(move || Self::decode_image(origin, &fetched.bytes))
            .await
            .map_err(|e| MediaLoadError::Decode(format!("Task join error: {}", e)))??;

        debug!(
            source = %image.source().origin(),
            dimensions = %image.source().dimensions(),
            "Decoded image"
        );
        Ok(image)
    }

    async fn open_video(&self, url: &str) -> Result<Box<dyn VideoSource>, MediaLoadError> {
        let location = parse_location(url)?;
        let origin = location.origin();

        let video = match location {
            MediaLocation::File(path) if path.exists() => {
                FfmpegVideoSource::open_path(&self.ffmpeg, &self.ffprobe, origin, path).await?
            }
            location => {
                let fetched = self.fetcher.fetch_location(location).await?;
                FfmpegVideoSource::open_bytes(&self.ffmpeg, &self.ffprobe, origin, fetched.bytes)
                    .await?
            }
        };
        Ok(Box::new(video))
    }
}

fn parse_location(url: &str) -> Result<MediaLocation, MediaLoadError> {
    MediaLocation::parse(url).map_err(|e| MediaLoadError::InvalidUrl(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::DataUri;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn loads_png_data_uri_with_natural_size() {
        let loader = FetchingMediaLoader::new(MediaFetcher::new(None));
        let uri = DataUri::encode("image/png", &png(12, 7));

        let image = loader.load_image(&uri).await.unwrap();

        assert_eq!(image.source().dimensions(), Dimensions::new(12, 7).unwrap());
        assert_eq!(image.source().kind(), MediaKind::Image);
        assert_eq!(image.pixels().get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[tokio::test]
    async fn undecodable_bytes_fail() {
        let loader = FetchingMediaLoader::new(MediaFetcher::new(None));
        let uri = DataUri::encode("image/png", b"not a png");

        let err = loader.load_image(&uri).await.unwrap_err();
        assert!(matches!(err, MediaLoadError::Decode(_)));
    }

    #[tokio::test]
    async fn empty_url_is_invalid() {
        let loader = FetchingMediaLoader::new(MediaFetcher::new(None));
        let err = loader.load_image("  ").await.unwrap_err();
        assert!(matches!(err, MediaLoadError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn malformed_inline_payload_is_invalid_url() {
        let loader = FetchingMediaLoader::new(MediaFetcher::new(None));
        let err = loader.load_image("data:image/png;base64,@@@").await.unwrap_err();
        assert!(matches!(err, MediaLoadError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn loads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, png(3, 5)).unwrap();

        let loader = FetchingMediaLoader::new(MediaFetcher::new(None));
        let image = loader.load_image(path.to_str().unwrap()).await.unwrap();
        assert_eq!(image.source().dimensions(), Dimensions::new(3, 5).unwrap());
    }
}
