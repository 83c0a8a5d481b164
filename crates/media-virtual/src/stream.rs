//! Capture streams produced by the virtual platform

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use localmedia_core::CaptureStream;

use crate::platform::CaptureRequest;

/// Stream handed out by [`VirtualPlatform`](crate::VirtualPlatform)
///
/// Records which devices it captures from, so callers can check that a
/// request was resolved the way they expect.
#[derive(Debug)]
pub struct VirtualStream {
    id: String,
    request: CaptureRequest,
    audio_device: Option<String>,
    video_device: Option<String>,
    started_at: DateTime<Utc>,
    active: AtomicBool,
}

impl VirtualStream {
    pub(crate) fn new(
        id: String,
        request: CaptureRequest,
        audio_device: Option<String>,
        video_device: Option<String>,
    ) -> Self {
        Self {
            id,
            request,
            audio_device,
            video_device,
            started_at: Utc::now(),
            active: AtomicBool::new(true),
        }
    }

    pub fn request(&self) -> &CaptureRequest {
        &self.request
    }

    pub fn audio_device(&self) -> Option<&str> {
        self.audio_device.as_deref()
    }

    pub fn video_device(&self) -> Option<&str> {
        self.video_device.as_deref()
    }

    pub fn captures_screen(&self) -> bool {
        matches!(self.request, CaptureRequest::DisplayMedia(_))
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether this stream reads from the given device
    pub(crate) fn uses_device(&self, device_id: &str) -> bool {
        self.audio_device.as_deref() == Some(device_id)
            || self.video_device.as_deref() == Some(device_id)
    }
}

impl CaptureStream for VirtualStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            tracing::debug!(stream_id = %self.id, "Virtual stream stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localmedia_core::UserMediaConstraints;

    #[test]
    fn test_stop_is_idempotent() {
        let before = Utc::now();
        let stream = VirtualStream::new(
            "stream-1".into(),
            CaptureRequest::UserMedia(UserMediaConstraints::default()),
            Some("mic-1".into()),
            Some("cam-1".into()),
        );

        assert!(stream.is_active());
        assert!(stream.started_at() >= before);
        stream.stop();
        stream.stop();
        assert!(!stream.is_active());
        assert!(stream.uses_device("cam-1"));
        assert!(!stream.captures_screen());
    }
}
