//! Media session controller
//!
//! [`MediaSessionController`] tracks the selected microphone and camera (or
//! screen), keeps one capture stream matching that selection, and mirrors
//! the platform's device list.
//!
//! # Concurrency
//!
//! Every refresh runs as a tokio task tracked by a [`TaskTracker`]. Capture
//! requests are never cancelled; each carries a [`RequestToken`] and only
//! the latest one may install its stream. Superseded streams are stopped
//! as soon as they arrive.
//!
//! Stream change notifications are delivered in install order: a stream is
//! announced before any newer stream can be installed.
//!
//! The device-change watcher is a separate task stopped through a
//! [`CancellationToken`] when the controller closes or is dropped.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use localmedia_core::{
    CaptureStream, DeviceDescriptor, MediaError, MediaPlatform, StreamHandle, VideoSource,
};

use crate::config::SessionConfig;
use crate::events::{NoopEventHandler, SessionEventHandler};
use crate::sequence::RequestToken;
use crate::state::{CapturePlan, SessionSnapshot, SessionState};

/// Result of a stream refresh that got a stream from the platform
#[derive(Debug, Clone)]
pub enum StreamUpdate {
    /// The stream is now the session's current stream
    Applied(StreamHandle),
    /// A newer request was issued first; the stream was stopped
    Superseded,
}

impl StreamUpdate {
    pub fn stream(&self) -> Option<&StreamHandle> {
        match self {
            Self::Applied(stream) => Some(stream),
            Self::Superseded => None,
        }
    }
}

/// Handle to a spawned stream refresh
pub type StreamRefresh = JoinHandle<Result<StreamUpdate, MediaError>>;

enum Install {
    Replaced(Option<StreamHandle>),
    Superseded,
    Closed,
}

/// Decrements the pending refresh count when a refresh task ends
struct PendingGuard(Arc<watch::Sender<usize>>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.send_modify(|pending| *pending -= 1);
    }
}

struct Shared<P> {
    platform: Arc<P>,
    state: Mutex<SessionState>,
    handler: RwLock<Arc<dyn SessionEventHandler>>,
    // Held from stream install until its handler call returns
    announce: Mutex<()>,
    include_system_audio: bool,
    tasks: TaskTracker,
    pending: Arc<watch::Sender<usize>>,
}

impl<P: MediaPlatform> Shared<P> {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn a refresh task counted by [`MediaSessionController::settle`]
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.pending.send_modify(|pending| *pending += 1);
        let guard = PendingGuard(Arc::clone(&self.pending));
        self.tasks.spawn(async move {
            let _guard = guard;
            future.await
        })
    }

    fn handler(&self) -> Arc<dyn SessionEventHandler> {
        self.handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Issue a capture request for the current selection
    fn begin_stream_refresh(
        &self,
        state: &mut SessionState,
    ) -> Result<(RequestToken, CapturePlan), MediaError> {
        if state.closed {
            return Err(MediaError::SessionClosed);
        }
        Ok(state.begin_capture(self.include_system_audio))
    }

    async fn finish_stream_refresh(
        &self,
        token: RequestToken,
        plan: CapturePlan,
    ) -> Result<StreamUpdate, MediaError> {
        tracing::debug!(%token, ?plan, "Requesting capture stream");

        let result = match plan {
            CapturePlan::UserMedia(constraints) => self.platform.get_user_media(constraints).await,
            CapturePlan::DisplayMedia(constraints) => {
                self.platform.get_display_media(constraints).await
            }
        };

        let stream = match result {
            Ok(stream) => stream,
            Err(err) => {
                let latest = self.lock().is_latest(token);
                if latest {
                    tracing::warn!(%token, "Capture request failed: {}", err);
                    self.handler().on_error(&err);
                } else {
                    tracing::debug!(%token, "Superseded capture request failed: {}", err);
                }
                return Err(err);
            }
        };

        // Taken before the state lock so handlers may read session state
        let announce = self.announce.lock().unwrap_or_else(PoisonError::into_inner);
        let install = {
            let mut state = self.lock();
            if state.closed {
                Install::Closed
            } else if state.is_latest(token) {
                Install::Replaced(state.replace_stream(Arc::clone(&stream)))
            } else {
                Install::Superseded
            }
        };

        match install {
            Install::Replaced(previous) => {
                if let Some(previous) = previous {
                    previous.stop();
                }
                tracing::info!(%token, stream_id = %stream.id(), "Capture stream updated");
                self.handler().on_stream_change(&stream);
                drop(announce);
                Ok(StreamUpdate::Applied(stream))
            }
            Install::Superseded => {
                drop(announce);
                tracing::debug!(%token, stream_id = %stream.id(), "Discarding superseded stream");
                stream.stop();
                Ok(StreamUpdate::Superseded)
            }
            Install::Closed => {
                drop(announce);
                tracing::debug!(%token, stream_id = %stream.id(), "Session closed, stopping stream");
                stream.stop();
                Err(MediaError::SessionClosed)
            }
        }
    }

    async fn refresh_devices(&self) -> Result<(), MediaError> {
        let closed = self.lock().closed;
        if closed {
            return Err(MediaError::SessionClosed);
        }

        let devices = match self.platform.enumerate_devices().await {
            Ok(devices) => devices,
            Err(err) => {
                tracing::warn!("Device enumeration failed: {}", err);
                self.handler().on_error(&err);
                return Err(err);
            }
        };

        let (audio, video) = {
            let mut state = self.lock();
            if state.closed {
                return Err(MediaError::SessionClosed);
            }
            state.replace_devices(devices);
            (state.audio_devices.len(), state.video_devices.len())
        };

        tracing::info!(audio, video, "Device list updated");
        self.handler().on_device_change();
        Ok(())
    }

    /// Mark the session closed and release its stream
    fn shutdown(&self) {
        let stream = {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.current_stream.take()
        };

        if let Some(stream) = stream {
            stream.stop();
        }
        tracing::info!("Media session closed");
    }
}

/// Builder for [`MediaSessionController`]
pub struct SessionBuilder<P> {
    platform: Arc<P>,
    config: SessionConfig,
    handler: Arc<dyn SessionEventHandler>,
}

impl<P: MediaPlatform> SessionBuilder<P> {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn event_handler(mut self, handler: Arc<dyn SessionEventHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Start the session
    ///
    /// Issues the initial stream request and device enumeration, and
    /// subscribes to device changes. Must be called within a tokio runtime.
    pub fn start(self) -> MediaSessionController<P> {
        let shared = Arc::new(Shared {
            platform: self.platform,
            state: Mutex::new(SessionState::new(
                self.config.audio_source,
                self.config.video_source,
            )),
            handler: RwLock::new(self.handler),
            announce: Mutex::new(()),
            include_system_audio: self.config.include_system_audio,
            tasks: TaskTracker::new(),
            pending: Arc::new(watch::channel(0).0),
        });

        let controller = MediaSessionController {
            shared,
            watcher: CancellationToken::new(),
        };

        tracing::info!("Media session started");
        controller.spawn_stream_refresh();
        controller.spawn_device_refresh();
        if self.config.watch_device_changes {
            controller.watch_device_changes();
        }

        controller
    }
}

/// Keeps a capture stream in sync with the selected devices
///
/// # Example
///
/// ```ignore
/// let (handler, mut events) = ChannelEventHandler::new();
/// let session = MediaSessionController::builder(platform)
///     .event_handler(Arc::new(handler))
///     .start();
///
/// session.set_audio_source("mic-2");
/// session.share_screen();
/// ```
pub struct MediaSessionController<P: MediaPlatform> {
    shared: Arc<Shared<P>>,
    watcher: CancellationToken,
}

impl<P: MediaPlatform> MediaSessionController<P> {
    pub fn builder(platform: Arc<P>) -> SessionBuilder<P> {
        SessionBuilder {
            platform,
            config: SessionConfig::default(),
            handler: Arc::new(NoopEventHandler),
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select a microphone and refresh the stream
    ///
    /// The id is not validated here; an unknown id surfaces as a capture
    /// error. An empty id selects the platform default.
    pub fn set_audio_source(&self, device_id: impl Into<String>) -> StreamRefresh {
        let device_id = device_id.into();
        tracing::debug!(device_id = %device_id, "Audio source selected");
        self.select(|state| state.set_audio_source(Some(device_id)))
    }

    /// Select a camera, or the screen with `"screen"`, and refresh the stream
    pub fn set_video_source(&self, source: impl Into<VideoSource>) -> StreamRefresh {
        let source = source.into();
        tracing::debug!(source = %source, "Video source selected");
        self.select(|state| state.set_video_source(Some(source)))
    }

    /// Capture the screen instead of a camera
    pub fn share_screen(&self) -> StreamRefresh {
        self.set_video_source(VideoSource::Screen)
    }

    /// Go back to the platform's default microphone
    pub fn use_default_audio_source(&self) -> StreamRefresh {
        self.select(|state| state.set_audio_source(None))
    }

    /// Go back to the platform's default camera
    pub fn use_default_video_source(&self) -> StreamRefresh {
        self.select(|state| state.set_video_source(None))
    }

    fn select(&self, apply: impl FnOnce(&mut SessionState)) -> StreamRefresh {
        let begun = {
            let mut state = self.shared.lock();
            apply(&mut *state);
            self.shared.begin_stream_refresh(&mut state)
        };
        self.spawn_begun(begun)
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Request a stream for the current selection and wait for it
    pub async fn refresh_stream(&self) -> Result<StreamUpdate, MediaError> {
        let begun = {
            let mut state = self.shared.lock();
            self.shared.begin_stream_refresh(&mut state)
        };
        let (token, plan) = begun?;
        self.shared.finish_stream_refresh(token, plan).await
    }

    /// Enumerate devices, replace both snapshots, and notify the handler
    pub async fn refresh_devices(&self) -> Result<(), MediaError> {
        self.shared.refresh_devices().await
    }

    fn spawn_stream_refresh(&self) {
        let begun = {
            let mut state = self.shared.lock();
            self.shared.begin_stream_refresh(&mut state)
        };
        // Outcome reaches the handler
        drop(self.spawn_begun(begun));
    }

    fn spawn_begun(&self, begun: Result<(RequestToken, CapturePlan), MediaError>) -> StreamRefresh {
        let shared = Arc::clone(&self.shared);
        self.shared.spawn(async move {
            let (token, plan) = begun?;
            shared.finish_stream_refresh(token, plan).await
        })
    }

    fn spawn_device_refresh(&self) {
        let shared = Arc::clone(&self.shared);
        self.shared.spawn(async move {
            // Failures are already reported to the handler
            let _ = shared.refresh_devices().await;
        });
    }

    fn watch_device_changes(&self) {
        let mut changes = self.shared.platform.device_changes();
        let shared = Arc::clone(&self.shared);
        let cancel = self.watcher.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    change = changes.next() => match change {
                        Some(()) => {
                            tracing::debug!("Platform reported a device change");
                            let refresh = Arc::clone(&shared);
                            shared.spawn(async move {
                                let _ = refresh.refresh_devices().await;
                            });
                        }
                        None => break,
                    },
                }
            }
            tracing::debug!("Device change watcher stopped");
        });
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn audio_source(&self) -> Option<String> {
        self.shared.lock().audio_source.clone()
    }

    pub fn video_source(&self) -> Option<VideoSource> {
        self.shared.lock().video_source.clone()
    }

    pub fn current_stream(&self) -> Option<StreamHandle> {
        self.shared.lock().current_stream.clone()
    }

    pub fn audio_devices(&self) -> Vec<DeviceDescriptor> {
        self.shared.lock().audio_devices.clone()
    }

    pub fn video_devices(&self) -> Vec<DeviceDescriptor> {
        self.shared.lock().video_devices.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.lock().snapshot()
    }

    /// Replace the session's event handler
    pub fn set_event_handler(&self, handler: Arc<dyn SessionEventHandler>) {
        *self
            .shared
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = handler;
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Wait until no refresh is pending
    ///
    /// Safe to call from several tasks at once.
    pub async fn settle(&self) {
        let mut pending = self.shared.pending.subscribe();
        // The sender lives in `shared`, which outlives this borrow
        let _ = pending.wait_for(|pending| *pending == 0).await;
    }

    /// Close the session and wait for in-flight requests
    ///
    /// Streams that arrive after closing are stopped immediately.
    pub async fn close(self) {
        self.watcher.cancel();
        self.shared.shutdown();
        self.shared.tasks.close();
        self.shared.tasks.wait().await;
    }
}

impl<P: MediaPlatform> Drop for MediaSessionController<P> {
    fn drop(&mut self) {
        self.watcher.cancel();
        self.shared.shutdown();
    }
}
