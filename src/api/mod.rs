//! HTTP client for the remote assistant API.
//!
//! The server owns authentication, chat storage, inference and speech
//! transcription. This module only maps calls onto its endpoints:
//! - `POST /login`, `POST /signup`
//! - `GET /chats`, `DELETE /chats`
//! - `GET /chat/{id}`, `POST /chat`, `DELETE /chat/{id}`
//! - `POST /speech_to_text` (raw WAV body)
//!
//! Requests are never retried.

pub mod config;
pub mod error;
pub mod types;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use types::{
    ChatRecord, ChatRequest, Credentials, LoginResponse, MessageResponse, TranscriptionResponse,
};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use url::Url;

/// Operations offered by the assistant API.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Verify credentials and return the canonical username.
    async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse>;

    /// Register a new account.
    async fn signup(&self, credentials: &Credentials) -> ApiResult<MessageResponse>;

    /// List every stored exchange of a user.
    async fn list_chats(&self, username: &str) -> ApiResult<Vec<ChatRecord>>;

    /// Fetch a single exchange.
    async fn get_chat(&self, id: i64) -> ApiResult<ChatRecord>;

    /// Ask the assistant a question; the server stores and returns the exchange.
    async fn send_message(&self, username: &str, question: &str) -> ApiResult<ChatRecord>;

    /// Delete a single exchange.
    async fn delete_chat(&self, id: i64) -> ApiResult<MessageResponse>;

    /// Delete every exchange of a user.
    async fn delete_all_chats(&self, username: &str) -> ApiResult<MessageResponse>;

    /// Upload a WAV clip and return the transcription.
    async fn speech_to_text(&self, wav: Vec<u8>) -> ApiResult<TranscriptionResponse>;
}

/// reqwest-backed implementation of [`ChatApi`].
pub struct ChatApiClient {
    config: ApiConfig,
    base_url: Url,
    client: reqwest::Client,
}

impl ChatApiClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be created.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let base_url = config
            .parsed_base_url()
            .map_err(|e| ApiError::HttpClient(e.to_string()))?;
        let client = Self::build_client(&config)?;

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Create a new client with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> ApiResult<Self> {
        Self::new(ApiConfig::default())
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Build an HTTP client with default headers and timeouts.
    fn build_client(config: &ApiConfig) -> ApiResult<reqwest::Client> {
        let mut headers = HeaderMap::new();

        if let Ok(ua) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()
            .map_err(|e| ApiError::HttpClient(e.to_string()))
    }

    /// Resolve an endpoint path against the base URL.
    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a prepared request and decode the JSON body.
    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> ApiResult<T> {
        let response = request.send().await.map_err(map_send_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_send_error)?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "API request rejected");
            return Err(ApiError::from_status_body(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Distinguish timeouts from other transport failures.
fn map_send_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::HttpRequest(err)
    }
}

#[async_trait]
impl ChatApi for ChatApiClient {
    async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse> {
        tracing::debug!(username = %credentials.username, "POST /login");
        let url = self.endpoint("login")?;
        self.execute(self.client.post(url).json(credentials)).await
    }

    async fn signup(&self, credentials: &Credentials) -> ApiResult<MessageResponse> {
        tracing::debug!(username = %credentials.username, "POST /signup");
        let url = self.endpoint("signup")?;
        self.execute(self.client.post(url).json(credentials)).await
    }

    async fn list_chats(&self, username: &str) -> ApiResult<Vec<ChatRecord>> {
        tracing::debug!(%username, "GET /chats");
        let url = self.endpoint("chats")?;
        self.execute(self.client.get(url).query(&[("username", username)]))
            .await
    }

    async fn get_chat(&self, id: i64) -> ApiResult<ChatRecord> {
        tracing::debug!(id, "GET /chat");
        let url = self.endpoint(&format!("chat/{id}"))?;
        self.execute(self.client.get(url)).await
    }

    async fn send_message(&self, username: &str, question: &str) -> ApiResult<ChatRecord> {
        tracing::debug!(%username, chars = question.chars().count(), "POST /chat");
        let url = self.endpoint("chat")?;
        let body = ChatRequest {
            question: question.to_string(),
        };
        self.execute(
            self.client
                .post(url)
                .query(&[("username", username)])
                .json(&body),
        )
        .await
    }

    async fn delete_chat(&self, id: i64) -> ApiResult<MessageResponse> {
        tracing::debug!(id, "DELETE /chat");
        let url = self.endpoint(&format!("chat/{id}"))?;
        self.execute(self.client.delete(url)).await
    }

    async fn delete_all_chats(&self, username: &str) -> ApiResult<MessageResponse> {
        tracing::debug!(%username, "DELETE /chats");
        let url = self.endpoint("chats")?;
        self.execute(self.client.delete(url).query(&[("username", username)]))
            .await
    }

    async fn speech_to_text(&self, wav: Vec<u8>) -> ApiResult<TranscriptionResponse> {
        tracing::debug!(bytes = wav.len(), "POST /speech_to_text");
        let url = self.endpoint("speech_to_text")?;
        self.execute(
            self.client
                .post(url)
                .header(CONTENT_TYPE, "audio/wav")
                .body(wav),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::SocketAddr;

    use axum::body::Bytes;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;

    /// Stand-in for the real assistant server.
    fn stub_router() -> Router {
        Router::new()
            .route(
                "/login",
                post(|Json(body): Json<Value>| async move {
                    if body["password"] == "secret" {
                        Ok(Json(json!({
                            "message": "Login successful",
                            "username": body["username"],
                        })))
                    } else {
                        Err((
                            StatusCode::BAD_REQUEST,
                            Json(json!({"detail": "Invalid username or password"})),
                        ))
                    }
                }),
            )
            .route(
                "/signup",
                post(|| async { Json(json!({"message": "User created successfully"})) }),
            )
            .route(
                "/chats",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let user = params.get("username").cloned().unwrap_or_default();
                    Json(json!([
                        {"id": 1, "question": format!("hello from {user}"), "answer": "hi"},
                        {"id": 2, "question": "second", "answer": "two"},
                    ]))
                })
                .delete(|Query(params): Query<HashMap<String, String>>| async move {
                    let user = params.get("username").cloned().unwrap_or_default();
                    Json(json!({"message": format!("Deleted 2 chats for {user}")}))
                }),
            )
            .route(
                "/chat",
                post(
                    |Query(params): Query<HashMap<String, String>>,
                     Json(body): Json<Value>| async move {
                        let user = params.get("username").cloned().unwrap_or_default();
                        Json(json!({
                            "id": 9,
                            "question": body["question"],
                            "answer": format!("answer for {user}"),
                        }))
                    },
                ),
            )
            .route(
                "/chat/{id}",
                get(|Path(id): Path<i64>| async move {
                    if id == 404 {
                        Err((StatusCode::NOT_FOUND, Json(json!({"detail": "Chat not found"}))))
                    } else {
                        Ok(Json(json!({"id": id, "question": "q", "answer": "a"})))
                    }
                })
                .delete(|Path(id): Path<i64>| async move {
                    Json(json!({"message": format!("deleted {id}")}))
                }),
            )
            .route(
                "/speech_to_text",
                post(|headers: AxumHeaders, body: Bytes| async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let riff = body.starts_with(b"RIFF");
                    Json(json!({"text": format!("{content_type} {riff} {}", body.len())}))
                }),
            )
    }

    async fn spawn_stub() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("bind failed: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("no local addr: {e}"));
        tokio::spawn(async move {
            let _ = axum::serve(listener, stub_router()).await;
        });
        addr
    }

    async fn client() -> ChatApiClient {
        let addr = spawn_stub().await;
        ChatApiClient::new(ApiConfig::new().with_base_url(format!("http://{addr}")))
            .unwrap_or_else(|e| panic!("client failed: {e}"))
    }

    #[test]
    fn test_client_creation() {
        let client = ChatApiClient::with_defaults();
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let client = ChatApiClient::new(ApiConfig::new().with_base_url("not a url"));
        assert!(matches!(client, Err(ApiError::HttpClient(_))));
    }

    #[tokio::test]
    async fn test_login_success_and_failure() {
        let api = client().await;

        let ok = api
            .login(&Credentials::new("alice", "secret"))
            .await
            .unwrap_or_else(|e| panic!("login failed: {e}"));
        assert_eq!(ok.username, "alice");

        let err = api
            .login(&Credentials::new("alice", "wrong"))
            .await
            .err()
            .unwrap_or_else(|| panic!("expected failure"));
        assert_eq!(err.user_message(), "Invalid username or password");
    }

    #[tokio::test]
    async fn test_signup() {
        let api = client().await;
        let response = api
            .signup(&Credentials::new("bob", "pw"))
            .await
            .unwrap_or_else(|e| panic!("signup failed: {e}"));
        assert_eq!(response.message, "User created successfully");
    }

    #[tokio::test]
    async fn test_chat_crud() {
        let api = client().await;

        let chats = api
            .list_chats("alice")
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].question, "hello from alice");

        let record = api
            .send_message("alice", "what is rust?")
            .await
            .unwrap_or_else(|e| panic!("send failed: {e}"));
        assert_eq!(record.id, 9);
        assert_eq!(record.question, "what is rust?");
        assert_eq!(record.answer, "answer for alice");

        let single = api
            .get_chat(3)
            .await
            .unwrap_or_else(|e| panic!("get failed: {e}"));
        assert_eq!(single.id, 3);

        let missing = api.get_chat(404).await;
        assert!(matches!(missing, Err(ref e) if e.is_not_found()));

        let deleted = api
            .delete_chat(3)
            .await
            .unwrap_or_else(|e| panic!("delete failed: {e}"));
        assert_eq!(deleted.message, "deleted 3");

        let cleared = api
            .delete_all_chats("alice")
            .await
            .unwrap_or_else(|e| panic!("clear failed: {e}"));
        assert!(cleared.message.contains("alice"));
    }

    #[tokio::test]
    async fn test_speech_upload_sends_raw_wav() {
        let api = client().await;
        let mut wav = b"RIFF".to_vec();
        wav.extend_from_slice(&[0_u8; 40]);
        let response = api
            .speech_to_text(wav)
            .await
            .unwrap_or_else(|e| panic!("upload failed: {e}"));
        assert_eq!(response.text, "audio/wav true 44");
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let api = ChatApiClient::new(ApiConfig::new().with_base_url("http://127.0.0.1:9"))
            .unwrap_or_else(|e| panic!("client failed: {e}"));
        let result = api.list_chats("alice").await;
        assert!(result.is_err());
    }
}
