//! Wire types exchanged with the assistant API.

use serde::{Deserialize, Serialize};

/// Username and password sent to `/login` and `/signup`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Plain-text password; only ever sent over the wire.
    pub password: String,
}

impl Credentials {
    /// Create credentials from any string-like values.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether both fields contain something other than whitespace.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of a successful `/login`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// Human-readable status message.
    pub message: String,
    /// Canonical username as stored by the server.
    pub username: String,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    /// Human-readable status message.
    pub message: String,
}

/// Body of `POST /chat`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The user's question.
    pub question: String,
}

/// One stored exchange as returned by the server.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRecord {
    /// Server-assigned chat id.
    pub id: i64,
    /// The user's question.
    pub question: String,
    /// The assistant's answer.
    pub answer: String,
}

/// Response of `POST /speech_to_text`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptionResponse {
    /// Transcribed text.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("alice", "hunter2");
        let printed = format!("{creds:?}");
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_credentials_completeness() {
        assert!(Credentials::new("alice", "pw").is_complete());
        assert!(!Credentials::new("   ", "pw").is_complete());
        assert!(!Credentials::new("alice", "").is_complete());
    }

    #[test]
    fn test_chat_record_deserializes_server_shape() {
        let record: ChatRecord =
            serde_json::from_str(r#"{"id":7,"question":"hi","answer":"hello"}"#)
                .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(record.id, 7);
        assert_eq!(record.answer, "hello");
    }
}
