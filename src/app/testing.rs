//! In-memory [`ChatApi`] used by controller and front-end tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::api::{
    ApiError, ApiResult, ChatApi, ChatRecord, Credentials, LoginResponse, MessageResponse,
    TranscriptionResponse,
};

/// Behaves like the assistant server: password `secret` logs in, `taken` is
/// an existing account, answers echo the question.
#[derive(Default)]
pub(crate) struct FakeApi {
    pub(crate) chats: Mutex<Vec<ChatRecord>>,
    pub(crate) uploads: Mutex<Vec<Vec<u8>>>,
    pub(crate) calls: AtomicUsize,
    offline: bool,
}

impl FakeApi {
    pub(crate) fn with_chats(chats: Vec<ChatRecord>) -> Self {
        Self {
            chats: Mutex::new(chats),
            ..Self::default()
        }
    }

    pub(crate) fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub(crate) fn chats(&self) -> MutexGuard<'_, Vec<ChatRecord>> {
        self.chats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn uploads(&self) -> Vec<Vec<u8>> {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> ApiResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            Err(ApiError::Status {
                status: 503,
                detail: "Service unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        detail: "Chat not found".to_string(),
    }
}

#[async_trait]
impl ChatApi for FakeApi {
    async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse> {
        self.check()?;
        if credentials.password == "secret" {
            Ok(LoginResponse {
                message: "Login successful".to_string(),
                username: credentials.username.clone(),
            })
        } else {
            Err(ApiError::Status {
                status: 401,
                detail: "Invalid username or password".to_string(),
            })
        }
    }

    async fn signup(&self, credentials: &Credentials) -> ApiResult<MessageResponse> {
        self.check()?;
        if credentials.username == "taken" {
            return Err(ApiError::Status {
                status: 400,
                detail: "Username already exists".to_string(),
            });
        }
        Ok(MessageResponse {
            message: "User created successfully".to_string(),
        })
    }

    async fn list_chats(&self, _username: &str) -> ApiResult<Vec<ChatRecord>> {
        self.check()?;
        Ok(self.chats().clone())
    }

    async fn get_chat(&self, id: i64) -> ApiResult<ChatRecord> {
        self.check()?;
        self.chats()
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn send_message(&self, _username: &str, question: &str) -> ApiResult<ChatRecord> {
        self.check()?;
        let mut chats = self.chats();
        let id = chats.iter().map(|record| record.id).max().unwrap_or(0) + 1;
        let record = ChatRecord {
            id,
            question: question.to_string(),
            answer: format!("echo: {question}"),
        };
        chats.push(record.clone());
        Ok(record)
    }

    async fn delete_chat(&self, id: i64) -> ApiResult<MessageResponse> {
        self.check()?;
        let mut chats = self.chats();
        let before = chats.len();
        chats.retain(|record| record.id != id);
        if chats.len() == before {
            return Err(not_found());
        }
        Ok(MessageResponse {
            message: "Chat deleted".to_string(),
        })
    }

    async fn delete_all_chats(&self, _username: &str) -> ApiResult<MessageResponse> {
        self.check()?;
        self.chats().clear();
        Ok(MessageResponse {
            message: "All chats deleted".to_string(),
        })
    }

    async fn speech_to_text(&self, wav: Vec<u8>) -> ApiResult<TranscriptionResponse> {
        self.check()?;
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(wav);
        Ok(TranscriptionResponse {
            text: " what is the weather ".to_string(),
        })
    }
}
