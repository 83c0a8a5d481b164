//! Session configuration

use std::fs;
use std::path::Path;

use localmedia_core::VideoSource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Options applied when a session starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Initial microphone; `None` uses the platform default
    pub audio_source: Option<String>,
    /// Initial camera, or `"screen"`; `None` uses the platform default
    pub video_source: Option<VideoSource>,
    /// Ask for system audio when sharing the screen
    pub include_system_audio: bool,
    /// Re-enumerate devices when the platform reports a change
    pub watch_device_changes: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            audio_source: None,
            video_source: None,
            include_system_audio: true,
            watch_device_changes: true,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = SessionConfig::from_json(r#"{"audio_source": "mic-2"}"#).unwrap();

        assert_eq!(config.audio_source.as_deref(), Some("mic-2"));
        assert_eq!(config.video_source, None);
        assert!(config.include_system_audio);
        assert!(config.watch_device_changes);
    }

    #[test]
    fn test_screen_video_source() {
        let config = SessionConfig::from_json(
            r#"{"video_source": "screen", "include_system_audio": false}"#,
        )
        .unwrap();

        assert_eq!(config.video_source, Some(VideoSource::Screen));
        assert!(!config.include_system_audio);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = SessionConfig::from_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SessionConfig::load("/nonexistent/localmedia.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
