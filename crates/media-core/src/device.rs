use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved video source value meaning "capture the screen"
pub const SCREEN_SOURCE: &str = "screen";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    AudioInput,
    AudioOutput,
    VideoInput,
    /// Any kind the platform reports that is not listed above
    #[serde(other)]
    Other,
}

/// Device record as reported by the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub device_id: String,
    pub kind: DeviceKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub group_id: String,
}

impl DeviceDescriptor {
    pub fn new(device_id: impl Into<String>, kind: DeviceKind, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind,
            label: label.into(),
            group_id: String::new(),
        }
    }

    /// Set the group identifier shared by devices of one physical unit
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }
}

/// Selected video input: a camera, or the screen
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VideoSource {
    Camera(String),
    Screen,
}

impl VideoSource {
    pub fn is_screen(&self) -> bool {
        matches!(self, Self::Screen)
    }

    /// Camera device id, if this source is a camera
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Self::Camera(id) => Some(id),
            Self::Screen => None,
        }
    }
}

impl From<&str> for VideoSource {
    fn from(value: &str) -> Self {
        if value == SCREEN_SOURCE {
            Self::Screen
        } else {
            Self::Camera(value.to_string())
        }
    }
}

impl From<String> for VideoSource {
    fn from(value: String) -> Self {
        if value == SCREEN_SOURCE {
            Self::Screen
        } else {
            Self::Camera(value)
        }
    }
}

impl From<VideoSource> for String {
    fn from(value: VideoSource) -> Self {
        match value {
            VideoSource::Camera(id) => id,
            VideoSource::Screen => SCREEN_SOURCE.to_string(),
        }
    }
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera(id) => write!(f, "{}", id),
            Self::Screen => write!(f, "{}", SCREEN_SOURCE),
        }
    }
}
