//! Media source value objects

use std::fmt;
use std::path::PathBuf;

use base64::Engine;
use thiserror::Error;

use crate::domain::composition::Dimensions;

/// Error when a media reference cannot be interpreted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaUrlError {
    #[error("Media URL is empty")]
    Empty,

    #[error("Malformed data URI: {0}")]
    MalformedDataUri(String),
}

/// Where a media source comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaOrigin {
    /// http(s) URL, fetched over the network
    Remote(String),
    /// Inline `data:` URI, decoded in memory
    DataUri { mime: String },
    /// Local file (`file://` URL or bare path)
    File(PathBuf),
}

impl MediaOrigin {
    /// Classify a media reference
    pub fn parse(url: &str) -> Result<Self, MediaUrlError> {
        MediaLocation::parse(url).map(|location| location.origin())
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for MediaOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::DataUri { mime } => write!(f, "data:{} (inline)", mime),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A parsed media reference. Inline payloads are decoded here, once, and
/// travel with the location to whoever reads the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaLocation {
    Remote(String),
    Inline(DataUri),
    File(PathBuf),
}

impl MediaLocation {
    pub fn parse(url: &str) -> Result<Self, MediaUrlError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(MediaUrlError::Empty);
        }

        let lower = url.to_ascii_lowercase();
        if lower.starts_with("data:") {
            return DataUri::parse(url).map(Self::Inline);
        }
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::Remote(url.to_string()));
        }
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(Self::File(PathBuf::from(path)));
        }
        Ok(Self::File(PathBuf::from(url)))
    }

    /// The payload-free origin recorded on a media source
    pub fn origin(&self) -> MediaOrigin {
        match self {
            Self::Remote(url) => MediaOrigin::Remote(url.clone()),
            Self::Inline(data) => MediaOrigin::DataUri {
                mime: data.mime.clone(),
            },
            Self::File(path) => MediaOrigin::File(path.clone()),
        }
    }
}

/// Decoded `data:` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

impl DataUri {
    /// Parse `data:[<mime>][;base64],<payload>`
    pub fn parse(uri: &str) -> Result<Self, MediaUrlError> {
        let malformed = |why: &str| MediaUrlError::MalformedDataUri(why.to_string());

        let rest = uri
            .get(..5)
            .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
            .map(|_| &uri[5..])
            .ok_or_else(|| malformed("missing data: scheme"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| malformed("missing ',' separator"))?;

        let mut params = header.split(';');
        let mime = match params.next() {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => "text/plain".to_string(),
        };
        let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

        let data = if is_base64 {
            base64::engine::general_purpose::STANDARD
                .decode(payload.trim())
                .map_err(|e| MediaUrlError::MalformedDataUri(e.to_string()))?
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };

        Ok(Self { mime, data })
    }

    /// Encode bytes as a base64 `data:` URI
    pub fn encode(mime: &str, data: &[u8]) -> String {
        format!(
            "data:{};base64,{}",
            mime,
            base64::engine::general_purpose::STANDARD.encode(data)
        )
    }
}

/// Kind of visual media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One image or video to render, with its natural size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    origin: MediaOrigin,
    dimensions: Dimensions,
    kind: MediaKind,
}

impl MediaSource {
    pub fn new(origin: MediaOrigin, dimensions: Dimensions, kind: MediaKind) -> Self {
        Self {
            origin,
            dimensions,
            kind,
        }
    }

    pub fn origin(&self) -> &MediaOrigin {
        &self.origin
    }

    /// Natural width and height
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}
