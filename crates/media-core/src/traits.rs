use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::constraints::{DisplayMediaConstraints, UserMediaConstraints};
use crate::device::DeviceDescriptor;
use crate::error::MediaError;

/// Live capture stream owned by whoever holds the handle
pub trait CaptureStream: Send + Sync + Debug {
    /// Platform identifier of this stream
    fn id(&self) -> &str;

    /// Whether the stream's tracks are still live
    fn is_active(&self) -> bool;

    /// Stop every track of this stream, releasing the capture devices
    ///
    /// Stopping an already stopped stream is a no-op.
    fn stop(&self);
}

/// Shared handle to a capture stream
pub type StreamHandle = Arc<dyn CaptureStream>;

/// Host media facility: device enumeration and stream capture
#[async_trait]
pub trait MediaPlatform: Send + Sync + 'static {
    /// List every media device currently known to the platform
    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, MediaError>;

    /// Capture from camera and microphone
    async fn get_user_media(
        &self,
        constraints: UserMediaConstraints,
    ) -> Result<StreamHandle, MediaError>;

    /// Capture the screen through the platform's share picker
    async fn get_display_media(
        &self,
        constraints: DisplayMediaConstraints,
    ) -> Result<StreamHandle, MediaError>;

    /// Notifications fired whenever the device list changes
    ///
    /// The stream ends when the platform stops reporting changes.
    fn device_changes(&self) -> BoxStream<'static, ()>;
}
