//! URL fetcher shared by the media and audio adapters
//!
//! Resolves http(s) URLs, `data:` URIs and local files into bytes. When a
//! capture origin is configured, remote responses must grant it access
//! through `Access-Control-Allow-Origin`.

use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, ORIGIN};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::application::ports::{AudioPrepError, MediaLoadError};
use crate::domain::media::{DataUri, MediaLocation};

/// Fetch errors
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Origin not allowed by {0}")]
    CrossOrigin(String),

    #[error("Failed to read file: {0}")]
    Io(String),
}

impl From<FetchError> for MediaLoadError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::InvalidUrl(m) => Self::InvalidUrl(m),
            FetchError::Transport(m) | FetchError::Io(m) => Self::Fetch(m),
            FetchError::Status(status) => Self::Status { status },
            FetchError::CrossOrigin(url) => Self::CrossOrigin(url),
        }
    }
}

impl From<FetchError> for AudioPrepError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Status(status) => Self::Status { status },
            other => Self::Fetch(other.to_string()),
        }
    }
}

/// Fetched payload
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Resolves media references into bytes
#[derive(Debug, Clone, Default)]
pub struct MediaFetcher {
    client: reqwest::Client,
    origin: Option<String>,
}

impl MediaFetcher {
    /// Create a fetcher. With `origin` set, remote media is subject to
    /// the cross-origin check.
    pub fn new(origin: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            origin: origin.filter(|o| !o.trim().is_empty()),
        }
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        let location =
            MediaLocation::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        self.fetch_location(location).await
    }

    /// Read the bytes behind an already parsed reference
    pub async fn fetch_location(&self, location: MediaLocation) -> Result<Fetched, FetchError> {
        match location {
            MediaLocation::Remote(url) => self.fetch_remote(&url).await,
            MediaLocation::Inline(DataUri { mime, data }) => Ok(Fetched {
                bytes: data,
                content_type: Some(mime),
            }),
            MediaLocation::File(path) => {
                let bytes = fs::read(&path)
                    .await
                    .map_err(|e| FetchError::Io(format!("{}: {}", path.display(), e)))?;
                Ok(Fetched {
                    bytes,
                    content_type: None,
                })
            }
        }
    }

    async fn fetch_remote(&self, url: &str) -> Result<Fetched, FetchError> {
        let mut request = self.client.get(url);
        if let Some(origin) = &self.origin {
            request = request.header(ORIGIN, origin);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(origin) = &self.origin {
            let allowed = response
                .headers()
                .get(ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok())
                .map(str::trim);
            if !matches!(allowed, Some(a) if a == "*" || a == origin) {
                debug!(url, origin = %origin, ?allowed, "Cross-origin check failed");
                return Err(FetchError::CrossOrigin(url.to_string()));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        debug!(url, bytes = bytes.len(), "Fetched remote media");
        Ok(Fetched {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
