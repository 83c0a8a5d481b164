//! Media session control
//!
//! Keeps a capture stream in sync with the user's microphone, camera or
//! screen selection, and mirrors the platform's device list.
//!
//! - [`controller`]: the [`MediaSessionController`] and its builder
//! - [`events`]: the single-slot event handler and stock handlers
//! - [`config`]: options applied when a session starts
//! - `state` / `sequence`: selection state and capture request tokens

pub mod config;
pub mod controller;
pub mod events;
mod sequence;
mod state;

pub use config::{ConfigError, SessionConfig};
pub use controller::{MediaSessionController, SessionBuilder, StreamRefresh, StreamUpdate};
pub use events::{
    ChannelEventHandler, LoggingEventHandler, NoopEventHandler, SessionEvent, SessionEventHandler,
};
pub use localmedia_core::{
    CaptureStream, DeviceConstraint, DeviceDescriptor, DeviceKind, DisplayMediaConstraints,
    MediaError, MediaErrorKind, MediaPlatform, StreamHandle, UserMediaConstraints, VideoSource,
};
pub use sequence::RequestToken;
pub use state::SessionSnapshot;
