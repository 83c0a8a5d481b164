//! Scriptable in-memory implementation of [`MediaPlatform`]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, oneshot, watch};

use localmedia_core::{
    CaptureStream, DeviceDescriptor, DeviceKind, DisplayMediaConstraints, MediaError,
    MediaPlatform, StreamHandle, UserMediaConstraints,
};

use crate::device::{default_devices, resolve_device};
use crate::stream::VirtualStream;

/// Capacity of the device-change broadcast channel
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// A capture request as received by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "constraints", rename_all = "camelCase")]
pub enum CaptureRequest {
    UserMedia(UserMediaConstraints),
    DisplayMedia(DisplayMediaConstraints),
}

struct PlatformState {
    devices: Vec<DeviceDescriptor>,
    permission_granted: bool,
    screen_share_cancelled: bool,
    enumeration_failure: Option<MediaError>,
    capture_failures: VecDeque<MediaError>,
    holding: bool,
    held: HashMap<usize, oneshot::Sender<()>>,
    requests: Vec<CaptureRequest>,
    streams: Vec<Arc<VirtualStream>>,
    enumerations: usize,
}

impl PlatformState {
    fn complete(
        &mut self,
        index: usize,
        request: CaptureRequest,
    ) -> Result<Arc<VirtualStream>, MediaError> {
        if let Some(err) = self.capture_failures.pop_front() {
            return Err(err);
        }
        if !self.permission_granted {
            return Err(MediaError::PermissionDenied);
        }

        let (audio, video) = match &request {
            CaptureRequest::UserMedia(constraints) => {
                let audio = resolve_device(
                    &self.devices,
                    DeviceKind::AudioInput,
                    constraints.audio.exact_id(),
                )?;
                let video = resolve_device(
                    &self.devices,
                    DeviceKind::VideoInput,
                    constraints.video.exact_id(),
                )?;
                (Some(audio), Some(video))
            }
            CaptureRequest::DisplayMedia(_) => {
                if self.screen_share_cancelled {
                    return Err(MediaError::SelectionCancelled);
                }
                (None, None)
            }
        };

        let stream = Arc::new(VirtualStream::new(
            format!("stream-{}", index + 1),
            request,
            audio,
            video,
        ));
        self.streams.push(Arc::clone(&stream));
        Ok(stream)
    }
}

/// In-memory media platform
///
/// Starts with [`default_devices`] and permission granted. Every capture
/// request is recorded in issue order; its index in [`requests`] is the
/// handle used by [`release`] when requests are held.
///
/// [`requests`]: VirtualPlatform::requests
/// [`release`]: VirtualPlatform::release
pub struct VirtualPlatform {
    state: Mutex<PlatformState>,
    changes: broadcast::Sender<()>,
    issued: watch::Sender<usize>,
}

impl Default for VirtualPlatform {
    fn default() -> Self {
        Self::with_devices(default_devices())
    }
}

impl VirtualPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: Vec<DeviceDescriptor>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let (issued, _) = watch::channel(0);

        Self {
            state: Mutex::new(PlatformState {
                devices,
                permission_granted: true,
                screen_share_cancelled: false,
                enumeration_failure: None,
                capture_failures: VecDeque::new(),
                holding: false,
                held: HashMap::new(),
                requests: Vec::new(),
                streams: Vec::new(),
                enumerations: 0,
            }),
            changes,
            issued,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Scripting
    // ========================================================================

    /// Grant or revoke capture and enumeration permission
    pub fn set_permission_granted(&self, granted: bool) {
        self.lock().permission_granted = granted;
    }

    /// Make the share picker report a cancellation
    pub fn cancel_screen_share(&self, cancelled: bool) {
        self.lock().screen_share_cancelled = cancelled;
    }

    /// Fail every enumeration with `error` until cleared with `None`
    pub fn fail_enumeration(&self, error: Option<MediaError>) {
        self.lock().enumeration_failure = error;
    }

    /// Fail the next capture request to complete
    pub fn fail_next_capture(&self, error: MediaError) {
        self.lock().capture_failures.push_back(error);
    }

    /// Hold capture requests until released
    ///
    /// Turning holding off releases everything currently held.
    pub fn hold_requests(&self, hold: bool) {
        let mut state = self.lock();
        state.holding = hold;
        if !hold {
            for (_, gate) in state.held.drain() {
                let _ = gate.send(());
            }
        }
    }

    /// Let the held request with this index complete
    pub fn release(&self, index: usize) -> bool {
        match self.lock().held.remove(&index) {
            Some(gate) => gate.send(()).is_ok(),
            None => false,
        }
    }

    /// Wait until at least `count` capture requests have been issued
    pub async fn wait_for_requests(&self, count: usize) {
        let mut issued = self.issued.subscribe();
        let _ = issued.wait_for(|issued| *issued >= count).await;
    }

    /// Add a device and notify listeners
    pub fn plug(&self, device: DeviceDescriptor) {
        tracing::debug!(device_id = %device.device_id, "Virtual device plugged");
        self.lock().devices.push(device);
        self.notify_device_change();
    }

    /// Remove a device, end the streams reading from it, and notify listeners
    pub fn unplug(&self, device_id: &str) -> bool {
        let removed = {
            let mut state = self.lock();
            let before = state.devices.len();
            state.devices.retain(|d| d.device_id != device_id);
            for stream in state.streams.iter().filter(|s| s.uses_device(device_id)) {
                stream.stop();
            }
            state.devices.len() != before
        };

        if removed {
            tracing::debug!(device_id, "Virtual device unplugged");
            self.notify_device_change();
        }
        removed
    }

    /// Fire a device-change notification without touching the device list
    pub fn notify_device_change(&self) {
        // No subscribers is fine
        let _ = self.changes.send(());
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Every capture request issued so far, in issue order
    pub fn requests(&self) -> Vec<CaptureRequest> {
        self.lock().requests.clone()
    }

    pub fn enumeration_count(&self) -> usize {
        self.lock().enumerations
    }

    pub fn stream(&self, id: &str) -> Option<Arc<VirtualStream>> {
        self.lock().streams.iter().find(|s| s.id() == id).cloned()
    }

    /// Streams that have not been stopped
    pub fn active_streams(&self) -> Vec<Arc<VirtualStream>> {
        self.lock()
            .streams
            .iter()
            .filter(|s| s.is_active())
            .cloned()
            .collect()
    }

    async fn capture(&self, request: CaptureRequest) -> Result<StreamHandle, MediaError> {
        let (index, gate) = {
            let mut state = self.lock();
            let index = state.requests.len();
            state.requests.push(request.clone());
            let gate = if state.holding {
                let (tx, rx) = oneshot::channel();
                state.held.insert(index, tx);
                Some(rx)
            } else {
                None
            };
            (index, gate)
        };
        self.issued.send_modify(|issued| *issued += 1);
        tracing::debug!(index, ?request, "Capture request issued");

        if let Some(gate) = gate {
            // A dropped sender releases the request too
            let _ = gate.await;
        }

        let result = self.lock().complete(index, request);
        result.map(|stream| stream as StreamHandle)
    }
}

#[async_trait]
impl MediaPlatform for VirtualPlatform {
    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, MediaError> {
        let mut state = self.lock();
        state.enumerations += 1;

        if let Some(err) = &state.enumeration_failure {
            return Err(err.clone());
        }
        if !state.permission_granted {
            return Err(MediaError::EnumerationFailed("permission denied".into()));
        }
        Ok(state.devices.clone())
    }

    async fn get_user_media(
        &self,
        constraints: UserMediaConstraints,
    ) -> Result<StreamHandle, MediaError> {
        self.capture(CaptureRequest::UserMedia(constraints)).await
    }

    async fn get_display_media(
        &self,
        constraints: DisplayMediaConstraints,
    ) -> Result<StreamHandle, MediaError> {
        self.capture(CaptureRequest::DisplayMedia(constraints)).await
    }

    fn device_changes(&self) -> BoxStream<'static, ()> {
        stream::unfold(self.changes.subscribe(), |mut rx| async move {
            match rx.recv().await {
                // Missed notifications still mean the list changed
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => Some(((), rx)),
                Err(broadcast::error::RecvError::Closed) => None,
            }
        })
        .boxed()
    }
}
