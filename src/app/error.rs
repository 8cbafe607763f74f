//! Errors surfaced by the controller.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;
use crate::audio::{AudioError, CaptureError};
use crate::config::ConfigError;

/// Any failure of a user-facing operation.
#[derive(Debug, Error)]
pub enum AppError {
    /// The assistant API failed or rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Audio could not be decoded or encoded.
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// The microphone could not be used.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The operation needs a logged-in user.
    #[error("not logged in")]
    NotLoggedIn,

    /// A local file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// Text shown inline next to the control that failed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            Self::Audio(err) => format!("Could not process the audio clip: {err}"),
            Self::Capture(CaptureError::AccessDenied(_)) => {
                "Microphone access was denied".to_string()
            }
            Self::Capture(CaptureError::NoDevice) => "No microphone found".to_string(),
            Self::Capture(err) => format!("Recording failed: {err}"),
            Self::NotLoggedIn => "Please log in first".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the failure should be shown as a blocking alert rather than inline text.
    #[must_use]
    pub const fn is_alert(&self) -> bool {
        matches!(self, Self::Audio(_) | Self::Capture(_) | Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_detail_is_shown() {
        let err = AppError::from(ApiError::Status {
            status: 401,
            detail: "Invalid username or password".to_string(),
        });
        assert_eq!(err.user_message(), "Invalid username or password");
        assert!(!err.is_alert());
    }

    #[test]
    fn test_capture_errors_are_alerts() {
        let err = AppError::from(CaptureError::AccessDenied("denied".to_string()));
        assert_eq!(err.user_message(), "Microphone access was denied");
        assert!(err.is_alert());
        assert!(AppError::from(AudioError::EmptyClip).is_alert());
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = AppError::Validation("Username is required".to_string());
        assert_eq!(err.user_message(), "Username is required");
    }
}
