mod constraints;
mod device;
mod error;
mod traits;

pub use constraints::{DeviceConstraint, DisplayMediaConstraints, UserMediaConstraints};
pub use device::{DeviceDescriptor, DeviceKind, VideoSource, SCREEN_SOURCE};
pub use error::{MediaError, MediaErrorKind};
pub use traits::{CaptureStream, MediaPlatform, StreamHandle};
