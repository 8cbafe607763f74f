//! Session and chat state shown by the front end.

use serde::{Deserialize, Serialize};

use crate::api::ChatRecord;

/// Number of words of the first question used as a history title.
pub const TITLE_WORDS: usize = 5;

/// Screen currently shown.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum View {
    /// Login form (default).
    #[default]
    Login,
    /// Signup form.
    Signup,
    /// Sidebar plus chat panel.
    Chat,
}

/// Who is logged in and what they see.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Logged-in username, if any.
    pub username: Option<String>,
    /// Current view.
    pub view: View,
}

impl SessionState {
    /// Whether someone is logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }
}

/// Author of a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing or speaking.
    User,
    /// The remote assistant.
    Assistant,
}

/// One message in a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author.
    pub role: Role,
    /// Text content.
    pub content: String,
}

impl Message {
    /// A message from the user.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// A message from the assistant.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The conversation displayed in the chat panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Server id of the latest exchange in this conversation.
    pub id: i64,
    /// Messages in server order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// A conversation holding exactly one stored exchange.
    #[must_use]
    pub fn from_record(record: &ChatRecord) -> Self {
        Self {
            id: record.id,
            messages: vec![
                Message::user(record.question.clone()),
                Message::assistant(record.answer.clone()),
            ],
        }
    }

    /// Append a stored exchange as returned by the server.
    pub fn push_record(&mut self, record: &ChatRecord) {
        self.id = record.id;
        self.messages.push(Message::user(record.question.clone()));
        self.messages.push(Message::assistant(record.answer.clone()));
    }
}

/// Sidebar entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Server chat id.
    pub id: i64,
    /// Title derived from the question.
    pub title: String,
}

impl HistoryEntry {
    /// Build an entry from a stored exchange.
    #[must_use]
    pub fn from_record(record: &ChatRecord) -> Self {
        Self {
            id: record.id,
            title: derive_title(&record.question),
        }
    }
}

/// First [`TITLE_WORDS`] words of a question, with `...` if anything was cut.
#[must_use]
pub fn derive_title(question: &str) -> String {
    let mut words = question.split_whitespace();
    let head: Vec<&str> = words.by_ref().take(TITLE_WORDS).collect();
    if head.is_empty() {
        return "Untitled chat".to_string();
    }
    let mut title = head.join(" ");
    if words.next().is_some() {
        title.push_str("...");
    }
    title
}

/// Chat panel and sidebar state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatState {
    /// Sidebar entries, newest last as the server lists them.
    pub history: Vec<HistoryEntry>,
    /// The conversation on screen, if any.
    pub current: Option<Conversation>,
    /// Text waiting in the input box.
    pub draft: String,
    /// A request is in flight; the send control is disabled.
    pub pending: bool,
    /// Question shown while its answer is pending.
    pub pending_question: Option<String>,
    /// Inline error text from the last failed operation.
    pub error: Option<String>,
    /// Informational text from the last successful operation.
    pub notice: Option<String>,
}

/// Everything the front end renders.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Session part.
    pub session: SessionState,
    /// Chat part.
    pub chat: ChatState,
}
