//! Actions and the reducer that applies them.

use crate::api::ChatRecord;

use super::state::{AppState, ChatState, Conversation, HistoryEntry, View};

/// A state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Login or signup succeeded for this username.
    LoggedIn(String),
    /// Session ended.
    LoggedOut,
    /// Switch between login and signup forms (or to chat when logged in).
    ShowView(View),
    /// The server's list of stored exchanges.
    HistoryLoaded(Vec<ChatRecord>),
    /// A saved chat fetched from the server replaces the current conversation.
    ConversationOpened(ChatRecord),
    /// Start with an empty chat panel.
    NewConversation,
    /// Input box changed.
    DraftChanged(String),
    /// A request went out; carries the question being sent, if any.
    RequestStarted(Option<String>),
    /// The server answered a question.
    ExchangeCompleted(ChatRecord),
    /// A request failed with this user-facing text.
    RequestFailed(String),
    /// A chat was deleted on the server.
    ChatDeleted(i64),
    /// Every chat of the user was deleted on the server.
    HistoryCleared,
    /// Informational message.
    Notice(String),
    /// Blocking alert (permission or decoding failures); shown like an error.
    Alert(String),
    /// Hide the current error and notice.
    DismissError,
}

/// Apply an action. This is the only place state changes.
pub fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::LoggedIn(username) => {
            state.session.username = Some(username);
            state.session.view = View::Chat;
            state.chat = ChatState::default();
        }
        Action::LoggedOut => {
            *state = AppState::default();
        }
        Action::ShowView(view) => {
            state.session.view = match view {
                View::Chat if !state.session.is_logged_in() => View::Login,
                other => other,
            };
            state.chat.error = None;
        }
        Action::HistoryLoaded(records) => {
            state.chat.history = records.iter().map(HistoryEntry::from_record).collect();
            finish_request(&mut state.chat);
        }
        Action::ConversationOpened(record) => {
            state.chat.current = Some(Conversation::from_record(&record));
            finish_request(&mut state.chat);
        }
        Action::NewConversation => {
            state.chat.current = None;
            state.chat.draft.clear();
            state.chat.error = None;
        }
        Action::DraftChanged(text) => {
            state.chat.draft = text;
        }
        Action::RequestStarted(question) => {
            state.chat.pending = true;
            state.chat.pending_question = question;
            state.chat.error = None;
            state.chat.notice = None;
        }
        Action::ExchangeCompleted(record) => {
            match state.chat.current.as_mut() {
                Some(conversation) => conversation.push_record(&record),
                None => state.chat.current = Some(Conversation::from_record(&record)),
            }
            if !state.chat.history.iter().any(|entry| entry.id == record.id) {
                state.chat.history.push(HistoryEntry::from_record(&record));
            }
            state.chat.draft.clear();
            finish_request(&mut state.chat);
        }
        Action::RequestFailed(message) | Action::Alert(message) => {
            finish_request(&mut state.chat);
            state.chat.error = Some(message);
        }
        Action::ChatDeleted(id) => {
            state.chat.history.retain(|entry| entry.id != id);
            if state
                .chat
                .current
                .as_ref()
                .is_some_and(|conversation| conversation.id == id)
            {
                state.chat.current = None;
            }
            finish_request(&mut state.chat);
        }
        Action::HistoryCleared => {
            state.chat.history.clear();
            state.chat.current = None;
            finish_request(&mut state.chat);
        }
        Action::Notice(message) => {
            finish_request(&mut state.chat);
            state.chat.notice = Some(message);
        }
        Action::DismissError => {
            state.chat.error = None;
            state.chat.notice = None;
        }
    }
}

fn finish_request(chat: &mut ChatState) {
    chat.pending = false;
    chat.pending_question = None;
}
