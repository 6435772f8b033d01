//! Composite asset and its locally resolvable handle

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use super::EncodingFormat;

const URL_PREFIX: &str = "blob:reelforge/";

/// Locally resolvable handle to an asset payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetUrl(String);

impl AssetUrl {
    fn generate() -> Self {
        Self(format!("{}{}", URL_PREFIX, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final encoded video produced by one compositor invocation.
///
/// The payload stays resolvable through its registry until the caller
/// revokes the URL.
#[derive(Clone)]
pub struct CompositeAsset {
    data: Arc<[u8]>,
    encoding: EncodingFormat,
    url: AssetUrl,
}

impl CompositeAsset {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn encoding(&self) -> EncodingFormat {
        self.encoding
    }

    pub fn mime_type(&self) -> String {
        self.encoding.mime_type()
    }

    pub fn url(&self) -> &AssetUrl {
        &self.url
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Write the payload to a file
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, &self.data)
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}

impl fmt::Debug for CompositeAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeAsset")
            .field("url", &self.url)
            .field("encoding", &self.encoding.mime_type())
            .field("size", &self.data.len())
            .finish()
    }
}

/// Registry of live asset URLs. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct ObjectUrlRegistry {
    entries: Arc<Mutex<HashMap<AssetUrl, Arc<[u8]>>>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a finished payload into an asset with a fresh URL
    pub fn register(&self, data: Vec<u8>, encoding: EncodingFormat) -> CompositeAsset {
        let data: Arc<[u8]> = data.into();
        let url = AssetUrl::generate();
        self.lock().insert(url.clone(), Arc::clone(&data));
        CompositeAsset {
            data,
            encoding,
            url,
        }
    }

    /// Look up a payload by URL
    pub fn resolve(&self, url: &AssetUrl) -> Option<Arc<[u8]>> {
        self.lock().get(url).cloned()
    }

    /// Release a URL. Returns false if it was not registered.
    pub fn revoke(&self, url: &AssetUrl) -> bool {
        self.lock().remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AssetUrl, Arc<[u8]>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
