//! In-memory media platform
//!
//! [`VirtualPlatform`] implements [`MediaPlatform`] without touching real
//! hardware. Devices, permissions and failures are scripted by the caller,
//! and capture requests can be held back and released one by one to
//! reproduce out-of-order completions.

mod device;
mod platform;
mod stream;

pub use device::default_devices;
pub use localmedia_core::{
    CaptureStream, DeviceDescriptor, DeviceKind, MediaError, MediaPlatform, StreamHandle,
};
pub use platform::{CaptureRequest, VirtualPlatform};
pub use stream::VirtualStream;
