//! Pollinations image generator
//!
//! Pollinations renders on GET, so generating an image is building its URL.
//! The compositor fetches it like any other remote image.

use async_trait::async_trait;

use crate::application::ports::{GenerationError, ImageGenerator};
use crate::domain::generation::ImageRequest;

const BASE_URL: &str = "https://image.pollinations.ai";

pub struct PollinationsImageGenerator {
    base_url: String,
}

impl PollinationsImageGenerator {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, request: &ImageRequest) -> String {
        format!(
            "{}/prompt/{}?width={}&height={}&seed={}&nologo=true",
            self.base_url,
            urlencoding::encode(request.prompt.trim()),
            request.width,
            request.height,
            request.seed
        )
    }
}

impl Default for PollinationsImageGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerator for PollinationsImageGenerator {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, GenerationError> {
        if request.prompt.trim().is_empty() {
            return Err(GenerationError::Failed("image prompt is empty".to_string()));
        }
        if request.width == 0 || request.height == 0 {
            return Err(GenerationError::Failed(format!(
                "invalid image size {}x{}",
                request.width, request.height
            )));
        }
        Ok(self.url_for(request))
    }
}
