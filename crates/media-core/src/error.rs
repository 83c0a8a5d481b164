use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("Permission denied for media capture")]
    PermissionDenied,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Screen share selection was cancelled")]
    SelectionCancelled,

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Device enumeration failed: {0}")]
    EnumerationFailed(String),

    #[error("Platform not supported: {0}")]
    PlatformNotSupported(String),

    #[error("Media session is closed")]
    SessionClosed,
}

/// Coarse classification reported alongside errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorKind {
    Capture,
    Enumeration,
    Session,
}

impl MediaError {
    pub fn kind(&self) -> MediaErrorKind {
        match self {
            Self::PermissionDenied
            | Self::DeviceNotFound(_)
            | Self::SelectionCancelled
            | Self::CaptureFailed(_)
            | Self::PlatformNotSupported(_) => MediaErrorKind::Capture,
            Self::EnumerationFailed(_) => MediaErrorKind::Enumeration,
            Self::SessionClosed => MediaErrorKind::Session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(MediaError::PermissionDenied.kind(), MediaErrorKind::Capture);
        assert_eq!(
            MediaError::DeviceNotFound("cam-9".into()).kind(),
            MediaErrorKind::Capture
        );
        assert_eq!(
            MediaError::EnumerationFailed("denied".into()).kind(),
            MediaErrorKind::Enumeration
        );
        assert_eq!(MediaError::SessionClosed.kind(), MediaErrorKind::Session);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            MediaError::DeviceNotFound("mic-2".into()).to_string(),
            "Device not found: mic-2"
        );
    }
}
