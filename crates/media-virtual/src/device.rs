use localmedia_core::{DeviceDescriptor, DeviceKind, MediaError};

/// A small desk setup: two microphones, a speaker and two cameras
pub fn default_devices() -> Vec<DeviceDescriptor> {
    vec![
        DeviceDescriptor::new("mic-1", DeviceKind::AudioInput, "Built-in Microphone")
            .with_group("builtin"),
        DeviceDescriptor::new("speaker-1", DeviceKind::AudioOutput, "Built-in Speakers")
            .with_group("builtin"),
        DeviceDescriptor::new("cam-1", DeviceKind::VideoInput, "Integrated Camera")
            .with_group("builtin"),
        DeviceDescriptor::new("mic-2", DeviceKind::AudioInput, "USB Headset Microphone")
            .with_group("headset"),
        DeviceDescriptor::new("cam-2", DeviceKind::VideoInput, "External USB Webcam"),
    ]
}

/// Resolve a capture constraint against the device list
pub(crate) fn resolve_device(
    devices: &[DeviceDescriptor],
    kind: DeviceKind,
    exact: Option<&str>,
) -> Result<String, MediaError> {
    let found = match exact {
        Some(id) => devices.iter().find(|d| d.kind == kind && d.device_id == id),
        None => devices.iter().find(|d| d.kind == kind),
    };

    found.map(|d| d.device_id.clone()).ok_or_else(|| {
        MediaError::DeviceNotFound(match exact {
            Some(id) => id.to_string(),
            None => kind_name(kind).to_string(),
        })
    })
}

fn kind_name(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::AudioInput => "audioinput",
        DeviceKind::AudioOutput => "audiooutput",
        DeviceKind::VideoInput => "videoinput",
        DeviceKind::Other => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_exact_and_any() {
        let devices = default_devices();

        assert_eq!(
            resolve_device(&devices, DeviceKind::AudioInput, Some("mic-2")).unwrap(),
            "mic-2"
        );
        assert_eq!(
            resolve_device(&devices, DeviceKind::AudioInput, None).unwrap(),
            "mic-1"
        );
    }

    #[test]
    fn test_resolve_rejects_wrong_kind() {
        let err = resolve_device(&default_devices(), DeviceKind::VideoInput, Some("mic-1"))
            .unwrap_err();
        assert_eq!(err, MediaError::DeviceNotFound("mic-1".into()));
    }

    #[test]
    fn test_resolve_any_without_devices() {
        let err = resolve_device(&[], DeviceKind::VideoInput, None).unwrap_err();
        assert_eq!(err, MediaError::DeviceNotFound("videoinput".into()));
    }
}
