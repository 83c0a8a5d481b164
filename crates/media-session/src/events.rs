//! Session event delivery
//!
//! A session has exactly one [`SessionEventHandler`] at a time. Handlers are
//! called from the session's tasks and must not block.

use localmedia_core::{CaptureStream, MediaError, StreamHandle};
use tokio::sync::mpsc;

/// Receives session notifications
pub trait SessionEventHandler: Send + Sync {
    /// A new capture stream replaced the previous one
    fn on_stream_change(&self, stream: &StreamHandle);

    /// The device snapshots were refreshed
    ///
    /// Fires after every enumeration, whether or not the lists changed.
    fn on_device_change(&self);

    /// A capture or enumeration request failed
    ///
    /// Session state is left as it was before the request.
    fn on_error(&self, _error: &MediaError) {}
}

/// Handler that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventHandler;

impl SessionEventHandler for NoopEventHandler {
    fn on_stream_change(&self, _stream: &StreamHandle) {}

    fn on_device_change(&self) {}
}

/// Handler that logs every event
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventHandler;

impl SessionEventHandler for LoggingEventHandler {
    fn on_stream_change(&self, stream: &StreamHandle) {
        tracing::info!(stream_id = %stream.id(), "Stream changed");
    }

    fn on_device_change(&self) {
        tracing::info!("Devices changed");
    }

    fn on_error(&self, error: &MediaError) {
        tracing::warn!(kind = ?error.kind(), "Session error: {}", error);
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    StreamChanged(StreamHandle),
    DevicesChanged,
    Error(MediaError),
}

/// Handler that forwards events over a channel
#[derive(Debug, Clone)]
pub struct ChannelEventHandler {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelEventHandler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: SessionEvent) {
        // Receiver gone means nobody is listening anymore
        let _ = self.tx.send(event);
    }
}

impl SessionEventHandler for ChannelEventHandler {
    fn on_stream_change(&self, stream: &StreamHandle) {
        self.send(SessionEvent::StreamChanged(stream.clone()));
    }

    fn on_device_change(&self) {
        self.send(SessionEvent::DevicesChanged);
    }

    fn on_error(&self, error: &MediaError) {
        self.send(SessionEvent::Error(error.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_handler_forwards_events() {
        let (handler, mut rx) = ChannelEventHandler::new();

        handler.on_device_change();
        handler.on_error(&MediaError::PermissionDenied);

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::DevicesChanged)));
        assert!(matches!(
            rx.try_recv(),
            Ok(SessionEvent::Error(MediaError::PermissionDenied))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_handler_survives_dropped_receiver() {
        let (handler, rx) = ChannelEventHandler::new();
        drop(rx);
        handler.on_device_change();
    }
}
