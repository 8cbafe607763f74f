//! Controller tying the API client, the voice pipeline and the state store together.
//!
//! Every operation dispatches its outcome into [`AppState`] before returning,
//! so a front end only has to render the state after each call. Failures are
//! also returned to the caller, which may ignore them.

pub mod error;
#[cfg(test)]
pub(crate) mod testing;

pub use error::AppError;

use std::path::Path;

use tracing::{info, warn};

use crate::api::{ChatApi, ChatRecord, Credentials};
use crate::audio::{Recording, recording_to_wav, transcode};
use crate::store::{Action, AppState, View, reduce};

/// Chat client controller over any [`ChatApi`].
pub struct ChatApp<A: ChatApi> {
    api: A,
    state: AppState,
}

impl<A: ChatApi> ChatApp<A> {
    /// Create a controller in the logged-out state.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: AppState::default(),
        }
    }

    /// Current state for rendering.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// The underlying API client.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Apply an action directly.
    pub fn dispatch(&mut self, action: Action) {
        reduce(&mut self.state, action);
    }

    /// Record a failure in state and hand it back.
    fn fail(&mut self, err: AppError) -> AppError {
        let message = err.user_message();
        warn!(error = %err, "Operation failed");
        if err.is_alert() {
            self.dispatch(Action::Alert(message));
        } else {
            self.dispatch(Action::RequestFailed(message));
        }
        err
    }

    /// Show a failure that happened outside the controller, such as a microphone error.
    pub fn report(&mut self, err: impl Into<AppError>) -> AppError {
        self.fail(err.into())
    }

    fn username(&self) -> Result<String, AppError> {
        self.state
            .session
            .username
            .clone()
            .ok_or(AppError::NotLoggedIn)
    }

    fn credentials(username: &str, password: &str) -> Result<Credentials, AppError> {
        let credentials = Credentials::new(username.trim(), password);
        if credentials.is_complete() {
            Ok(credentials)
        } else {
            Err(AppError::Validation(
                "Username and password are required".to_string(),
            ))
        }
    }

    /// Switch between the login and signup forms.
    pub fn show_view(&mut self, view: View) {
        self.dispatch(Action::ShowView(view));
    }

    /// Log in, then load the user's history.
    ///
    /// A failure to load history leaves the user logged in with the error shown.
    ///
    /// # Errors
    /// Returns a validation error for empty fields, or the API failure.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), AppError> {
        let credentials = match Self::credentials(username, password) {
            Ok(credentials) => credentials,
            Err(err) => return Err(self.fail(err)),
        };

        self.dispatch(Action::RequestStarted(None));
        match self.api.login(&credentials).await {
            Ok(response) => {
                info!(username = %response.username, "Logged in");
                self.dispatch(Action::LoggedIn(response.username));
            }
            Err(err) => return Err(self.fail(err.into())),
        }

        if let Err(err) = self.refresh_history().await {
            warn!(error = %err, "History unavailable after login");
        }
        Ok(())
    }

    /// Create an account and return to the login form.
    ///
    /// # Errors
    /// Returns a validation error for empty fields, or the API failure.
    pub async fn signup(&mut self, username: &str, password: &str) -> Result<(), AppError> {
        let credentials = match Self::credentials(username, password) {
            Ok(credentials) => credentials,
            Err(err) => return Err(self.fail(err)),
        };

        self.dispatch(Action::RequestStarted(None));
        match self.api.signup(&credentials).await {
            Ok(response) => {
                info!(username = %credentials.username, "Account created");
                self.dispatch(Action::ShowView(View::Login));
                self.dispatch(Action::Notice(response.message));
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Forget the session and every piece of chat state.
    pub fn logout(&mut self) {
        info!("Logged out");
        self.dispatch(Action::LoggedOut);
    }

    /// Reload the sidebar from the server.
    ///
    /// # Errors
    /// Returns [`AppError::NotLoggedIn`] or the API failure.
    pub async fn refresh_history(&mut self) -> Result<(), AppError> {
        let username = match self.username() {
            Ok(username) => username,
            Err(err) => return Err(self.fail(err)),
        };

        self.dispatch(Action::RequestStarted(None));
        match self.api.list_chats(&username).await {
            Ok(records) => {
                self.dispatch(Action::HistoryLoaded(records));
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Show a saved chat in place of the current conversation.
    ///
    /// # Errors
    /// Returns [`AppError::NotLoggedIn`] or the API failure.
    pub async fn open_chat(&mut self, id: i64) -> Result<(), AppError> {
        if let Err(err) = self.username() {
            return Err(self.fail(err));
        }

        self.dispatch(Action::RequestStarted(None));
        match self.api.get_chat(id).await {
            Ok(record) => {
                self.dispatch(Action::ConversationOpened(record));
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Clear the chat panel; the next message starts a new conversation.
    pub fn new_conversation(&mut self) {
        self.dispatch(Action::NewConversation);
    }

    /// Replace the draft.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.dispatch(Action::DraftChanged(text.into()));
    }

    /// Hide the current error and notice.
    pub fn dismiss_error(&mut self) {
        self.dispatch(Action::DismissError);
    }

    /// Ask a question and append the stored exchange to the conversation.
    ///
    /// # Errors
    /// Returns a validation error for a blank message, or the API failure.
    pub async fn send_message(&mut self, text: &str) -> Result<ChatRecord, AppError> {
        let question = text.trim();
        if question.is_empty() {
            return Err(self.fail(AppError::Validation(
                "Message cannot be empty".to_string(),
            )));
        }
        let username = match self.username() {
            Ok(username) => username,
            Err(err) => return Err(self.fail(err)),
        };

        self.dispatch(Action::RequestStarted(Some(question.to_string())));
        match self.api.send_message(&username, question).await {
            Ok(record) => {
                info!(id = record.id, "Answer received");
                self.dispatch(Action::ExchangeCompleted(record.clone()));
                Ok(record)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Send whatever is in the draft.
    ///
    /// # Errors
    /// See [`ChatApp::send_message`].
    pub async fn send_draft(&mut self) -> Result<ChatRecord, AppError> {
        let draft = self.state.chat.draft.clone();
        self.send_message(&draft).await
    }

    /// Delete one saved chat.
    ///
    /// # Errors
    /// Returns [`AppError::NotLoggedIn`] or the API failure.
    pub async fn delete_chat(&mut self, id: i64) -> Result<(), AppError> {
        if let Err(err) = self.username() {
            return Err(self.fail(err));
        }

        self.dispatch(Action::RequestStarted(None));
        match self.api.delete_chat(id).await {
            Ok(_) => {
                info!(id, "Chat deleted");
                self.dispatch(Action::ChatDeleted(id));
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Delete every saved chat of the current user.
    ///
    /// # Errors
    /// Returns [`AppError::NotLoggedIn`] or the API failure.
    pub async fn clear_history(&mut self) -> Result<(), AppError> {
        let username = match self.username() {
            Ok(username) => username,
            Err(err) => return Err(self.fail(err)),
        };

        self.dispatch(Action::RequestStarted(None));
        match self.api.delete_all_chats(&username).await {
            Ok(_) => {
                info!("History cleared");
                self.dispatch(Action::HistoryCleared);
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Encode a microphone recording, transcribe it and put the text in the draft.
    ///
    /// # Errors
    /// Returns an audio error for an empty recording, or the API failure.
    pub async fn transcribe_recording(&mut self, recording: Recording) -> Result<String, AppError> {
        self.dispatch(Action::RequestStarted(None));
        let wav = match recording_to_wav(recording) {
            Ok(wav) => wav,
            Err(err) => return Err(self.discard_clip(err.into())),
        };
        self.transcribe_wav(wav).await
    }

    /// Read an audio file in any supported container, transcode it to WAV and transcribe it.
    ///
    /// # Errors
    /// Returns an I/O or audio error if the file cannot be used, or the API failure.
    pub async fn transcribe_file(&mut self, path: &Path) -> Result<String, AppError> {
        self.dispatch(Action::RequestStarted(None));
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(source) => {
                return Err(self.discard_clip(AppError::Io {
                    path: path.to_path_buf(),
                    source,
                }));
            }
        };
        let wav = match transcode(&bytes) {
            Ok(wav) => wav,
            Err(err) => return Err(self.discard_clip(err.into())),
        };
        self.transcribe_wav(wav).await
    }

    /// A clip that cannot be decoded or transcribed leaves the input empty.
    fn discard_clip(&mut self, err: AppError) -> AppError {
        self.dispatch(Action::DraftChanged(String::new()));
        self.fail(err)
    }

    async fn transcribe_wav(&mut self, wav: Vec<u8>) -> Result<String, AppError> {
        match self.api.speech_to_text(wav).await {
            Ok(response) => {
                let text = response.text.trim().to_string();
                info!(chars = text.chars().count(), "Transcription received");
                self.dispatch(Action::DraftChanged(text.clone()));
                self.dispatch(Action::Notice("Transcription ready".to_string()));
                Ok(text)
            }
            Err(err) => Err(self.discard_clip(err.into())),
        }
    }
}
