//! Error types for the assistant API client.

use thiserror::Error;

/// Errors that can occur while talking to the assistant API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Base URL or endpoint path could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error detail reported by the server, or the raw body.
        detail: String,
    },

    /// Response body was not the JSON we expected.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,
}

impl ApiError {
    /// Text suitable for showing inline next to the control that failed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { detail, .. } if !detail.is_empty() => detail.clone(),
            Self::Status { status, .. } => format!("Request failed with status {status}"),
            Self::Timeout => "The server took too long to answer".to_string(),
            Self::HttpRequest(err) if err.is_connect() => {
                "Could not reach the server".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Whether the server rejected the request as not found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Build a status error from a response body, preferring the server's `detail` field.
    #[must_use]
    pub fn from_status_body(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| match value.get("detail") {
                Some(serde_json::Value::String(text)) => Some(text.clone()),
                Some(other) => Some(other.to_string()),
                None => None,
            })
            .unwrap_or_else(|| body.trim().to_string());
        Self::Status { status, detail }
    }
}

/// Convenience result alias for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
