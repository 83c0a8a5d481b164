//! Media session state
//!
//! [`SessionState`] holds the device selection, the current stream and the
//! device snapshots. It lives behind the controller's mutex, which is never
//! held across an `.await` or while a handler runs.

use localmedia_core::{
    CaptureStream, DeviceConstraint, DeviceDescriptor, DeviceKind, DisplayMediaConstraints,
    StreamHandle, UserMediaConstraints, VideoSource,
};
use serde::Serialize;

use crate::sequence::{RequestSequencer, RequestToken};

/// Which platform call a stream refresh makes
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CapturePlan {
    UserMedia(UserMediaConstraints),
    DisplayMedia(DisplayMediaConstraints),
}

/// Serializable view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub audio_source: Option<String>,
    pub video_source: Option<VideoSource>,
    pub stream_id: Option<String>,
    pub stream_active: bool,
    pub audio_devices: Vec<DeviceDescriptor>,
    pub video_devices: Vec<DeviceDescriptor>,
}

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub audio_source: Option<String>,
    pub video_source: Option<VideoSource>,
    pub current_stream: Option<StreamHandle>,
    pub audio_devices: Vec<DeviceDescriptor>,
    pub video_devices: Vec<DeviceDescriptor>,
    pub closed: bool,
    sequencer: RequestSequencer,
}

impl SessionState {
    pub fn new(audio_source: Option<String>, video_source: Option<VideoSource>) -> Self {
        Self {
            audio_source: normalize_audio(audio_source),
            video_source: normalize_video(video_source),
            ..Self::default()
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn set_audio_source(&mut self, device_id: Option<String>) {
        self.audio_source = normalize_audio(device_id);
    }

    pub fn set_video_source(&mut self, source: Option<VideoSource>) {
        self.video_source = normalize_video(source);
    }

    /// Issue a token and build the request for the current selection
    pub fn begin_capture(&mut self, include_system_audio: bool) -> (RequestToken, CapturePlan) {
        let plan = match &self.video_source {
            Some(VideoSource::Screen) => CapturePlan::DisplayMedia(DisplayMediaConstraints {
                system_audio: include_system_audio,
                ..DisplayMediaConstraints::default()
            }),
            camera => CapturePlan::UserMedia(UserMediaConstraints {
                audio: DeviceConstraint::from_selection(self.audio_source.as_deref()),
                video: DeviceConstraint::from_selection(
                    camera.as_ref().and_then(VideoSource::device_id),
                ),
            }),
        };
        (self.sequencer.issue(), plan)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.sequencer.is_latest(token)
    }

    // ========================================================================
    // Stream and devices
    // ========================================================================

    /// Install a new stream, returning the one it replaces
    pub fn replace_stream(&mut self, stream: StreamHandle) -> Option<StreamHandle> {
        self.current_stream.replace(stream)
    }

    /// Replace both device snapshots, keeping the reported order
    pub fn replace_devices(&mut self, devices: Vec<DeviceDescriptor>) {
        let (audio, rest): (Vec<_>, Vec<_>) = devices
            .into_iter()
            .partition(|d| d.kind == DeviceKind::AudioInput);
        self.audio_devices = audio;
        self.video_devices = rest
            .into_iter()
            .filter(|d| d.kind == DeviceKind::VideoInput)
            .collect();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            audio_source: self.audio_source.clone(),
            video_source: self.video_source.clone(),
            stream_id: self.current_stream.as_ref().map(|s| s.id().to_string()),
            stream_active: self.current_stream.as_ref().is_some_and(|s| s.is_active()),
            audio_devices: self.audio_devices.clone(),
            video_devices: self.video_devices.clone(),
        }
    }
}

// An empty id selects the platform default
fn normalize_audio(device_id: Option<String>) -> Option<String> {
    device_id.filter(|id| !id.is_empty())
}

fn normalize_video(source: Option<VideoSource>) -> Option<VideoSource> {
    source.filter(|s| !matches!(s, VideoSource::Camera(id) if id.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, kind: DeviceKind) -> DeviceDescriptor {
        DeviceDescriptor::new(id, kind, id)
    }

    #[test]
    fn test_default_selection_is_unconstrained() {
        let mut state = SessionState::default();
        let (_, plan) = state.begin_capture(true);

        assert_eq!(plan, CapturePlan::UserMedia(UserMediaConstraints::default()));
    }

    #[test]
    fn test_selection_becomes_exact_constraint() {
        let mut state = SessionState::new(Some("mic-2".into()), None);
        let (_, plan) = state.begin_capture(true);

        assert_eq!(
            plan,
            CapturePlan::UserMedia(UserMediaConstraints {
                audio: DeviceConstraint::Exact("mic-2".into()),
                video: DeviceConstraint::Any,
            })
        );
    }

    #[test]
    fn test_screen_selection_requests_display_media() {
        let mut state = SessionState::new(Some("mic-2".into()), Some(VideoSource::Screen));

        let (_, plan) = state.begin_capture(true);
        assert_eq!(plan, CapturePlan::DisplayMedia(DisplayMediaConstraints::default()));

        let (_, plan) = state.begin_capture(false);
        match plan {
            CapturePlan::DisplayMedia(constraints) => assert!(!constraints.system_audio),
            other => panic!("unexpected plan: {:?}", other),
        }
    }

    #[test]
    fn test_empty_ids_select_default() {
        let mut state = SessionState::new(Some(String::new()), Some(VideoSource::from("")));
        assert_eq!(state.audio_source, None);
        assert_eq!(state.video_source, None);

        state.set_audio_source(Some("mic-1".into()));
        state.set_audio_source(Some(String::new()));
        assert_eq!(state.audio_source, None);
    }

    #[test]
    fn test_begin_capture_supersedes_previous_token() {
        let mut state = SessionState::default();
        let (first, _) = state.begin_capture(true);
        let (second, _) = state.begin_capture(true);

        assert!(!state.is_latest(first));
        assert!(state.is_latest(second));
    }

    #[test]
    fn test_replace_devices_partitions_by_kind() {
        let mut state = SessionState::default();
        state.replace_devices(vec![
            device("cam-1", DeviceKind::VideoInput),
            device("mic-1", DeviceKind::AudioInput),
            device("speaker-1", DeviceKind::AudioOutput),
            device("midi-1", DeviceKind::Other),
            device("mic-2", DeviceKind::AudioInput),
            device("cam-2", DeviceKind::VideoInput),
        ]);

        let audio: Vec<_> = state.audio_devices.iter().map(|d| d.device_id.as_str()).collect();
        let video: Vec<_> = state.video_devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(audio, ["mic-1", "mic-2"]);
        assert_eq!(video, ["cam-1", "cam-2"]);

        state.replace_devices(Vec::new());
        assert!(state.audio_devices.is_empty());
        assert!(state.video_devices.is_empty());
    }
}
