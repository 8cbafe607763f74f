//! Client-side session and chat state.
//!
//! State is plain data; [`reduce`] is the only function that mutates it.
//! The server stays authoritative: results replace what is on screen, and no
//! client-side merging is attempted.

pub mod reducer;
pub mod state;

pub use reducer::{Action, reduce};
pub use state::{
    AppState, ChatState, Conversation, HistoryEntry, Message, Role, SessionState, View,
    derive_title,
};
