//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::output::EncodingFormat;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;
    presenter.output(display_value(&config, key).as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, display_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Validate a value and store it under its key
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let text = Some(value.to_string());
    match key {
        "gemini_api_key" => config.gemini_api_key = text,
        "elevenlabs_api_key" => config.elevenlabs_api_key = text,
        "elevenlabs_voice" => config.elevenlabs_voice = text,
        "image_duration" | "stitch_timeout" | "crop_timeout" => {
            value
                .parse::<Duration>()
                .map_err(|e| invalid(key, e.to_string()))?;
            match key {
                "image_duration" => config.image_duration = text,
                "stitch_timeout" => config.stitch_timeout = text,
                _ => config.crop_timeout = text,
            }
        }
        "frame_rate" => {
            let fps: u32 = value
                .parse()
                .map_err(|_| invalid(key, "Value must be a whole number of frames per second"))?;
            if !(1..=120).contains(&fps) {
                return Err(invalid(key, "Value must be between 1 and 120"));
            }
            config.frame_rate = Some(fps);
        }
        "encodings" => {
            EncodingFormat::parse_list(value).map_err(|e| invalid(key, e.to_string()))?;
            config.encodings = text;
        }
        "ffmpeg_path" => config.ffmpeg_path = text,
        "ffprobe_path" => config.ffprobe_path = text,
        "origin" => {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(invalid(key, "Value must be an http(s) origin"));
            }
            config.origin = Some(value.trim_end_matches('/').to_string());
        }
        "monitor_audio" => {
            let enabled =
                parse_bool(value).map_err(|_| invalid(key, "Value must be 'true' or 'false'"))?;
            config.monitor_audio = Some(enabled);
        }
        "output_dir" => config.output_dir = text,
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

/// Value of a key as shown to the user, with secrets masked
fn display_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "gemini_api_key" => config.gemini_api_key.as_deref().map(mask_api_key),
        "elevenlabs_api_key" => config.elevenlabs_api_key.as_deref().map(mask_api_key),
        "elevenlabs_voice" => config.elevenlabs_voice.clone(),
        "image_duration" => config.image_duration.clone(),
        "stitch_timeout" => config.stitch_timeout.clone(),
        "crop_timeout" => config.crop_timeout.clone(),
        "frame_rate" => config.frame_rate.map(|f| f.to_string()),
        "encodings" => config.encodings.clone(),
        "ffmpeg_path" => config.ffmpeg_path.clone(),
        "ffprobe_path" => config.ffprobe_path.clone(),
        "origin" => config.origin.clone(),
        "monitor_audio" => config.monitor_audio.map(|b| b.to_string()),
        "output_dir" => config.output_dir.clone(),
        _ => None,
    }
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}

/// Mask API key for display (show first 4 and last 4 chars)
fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
