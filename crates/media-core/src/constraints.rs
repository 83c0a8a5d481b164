//! Capture request constraints
//!
//! These mirror the shape of the host's `getUserMedia`/`getDisplayMedia`
//! constraint dictionaries so platform backends can forward them directly.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Device constraint for one media kind
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceConstraint {
    /// Any available device
    #[default]
    Any,
    /// Exactly this device id
    Exact(String),
}

impl DeviceConstraint {
    /// Build a constraint from an optional selection
    pub fn from_selection(device_id: Option<&str>) -> Self {
        match device_id {
            Some(id) => Self::Exact(id.to_string()),
            None => Self::Any,
        }
    }

    pub fn exact_id(&self) -> Option<&str> {
        match self {
            Self::Exact(id) => Some(id),
            Self::Any => None,
        }
    }
}

// `true` or `{"deviceId": {"exact": id}}`
impl Serialize for DeviceConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Any => serializer.serialize_bool(true),
            Self::Exact(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("deviceId", &ExactId(id))?;
                map.end()
            }
        }
    }
}

struct ExactId<'a>(&'a str);

impl Serialize for ExactId<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("exact", self.0)?;
        map.end()
    }
}

/// Constraints for a camera/microphone capture request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UserMediaConstraints {
    pub audio: DeviceConstraint,
    pub video: DeviceConstraint,
}

/// Constraints for a screen capture request
///
/// Source selection is left to the platform's share picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMediaConstraints {
    pub video: bool,
    pub audio: bool,
    #[serde(serialize_with = "serialize_system_audio")]
    pub system_audio: bool,
}

impl Default for DisplayMediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
            system_audio: true,
        }
    }
}

fn serialize_system_audio<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "include" } else { "exclude" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_from_selection() {
        assert_eq!(DeviceConstraint::from_selection(None), DeviceConstraint::Any);
        assert_eq!(
            DeviceConstraint::from_selection(Some("mic-2")),
            DeviceConstraint::Exact("mic-2".into())
        );
    }

    #[test]
    fn test_user_media_serializes_like_host_dictionary() {
        let constraints = UserMediaConstraints {
            audio: DeviceConstraint::Exact("mic-2".into()),
            video: DeviceConstraint::Any,
        };
        let value = serde_json::to_value(&constraints).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "audio": {"deviceId": {"exact": "mic-2"}},
                "video": true
            })
        );
    }

    #[test]
    fn test_display_media_requests_system_audio() {
        let value = serde_json::to_value(DisplayMediaConstraints::default()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"video": true, "audio": true, "systemAudio": "include"})
        );
    }
}
