//! Domain error types

use thiserror::Error;

const DURATION_FORMATS: &str = concat!(
    "Expected format: <number>ms, <number>s, <number>m, or <number>m<number>s ",
    "(e.g., 500ms, 5s, 1m, 2m30s)"
);

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". {}", DURATION_FORMATS)]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a width or height is unusable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid dimensions {width}x{height}: width and height must be non-zero")]
pub struct InvalidDimensions {
    pub width: u32,
    pub height: u32,
}

/// Error when an encoding identifier cannot be parsed
#[derive(Debug, Clone, Error)]
#[error("Unknown encoding: \"{input}\". Expected a MIME type such as video/webm;codecs=vp9,opus")]
pub struct EncodingParseError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
