//! Settings storage port

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Persistent store for the user's settings file
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the stored settings. A missing file yields an empty config.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Write the settings, creating parent directories as needed
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Location of the settings file
    fn path(&self) -> PathBuf;

    fn exists(&self) -> bool;

    /// Write `AppConfig::defaults()`; fails with `AlreadyExists` when a file is present
    async fn init(&self) -> Result<(), ConfigError>;
}
