//! Plain-text rendering of the application state.

use std::io::{self, Write};

use crate::api::ChatRecord;
use crate::store::{AppState, Conversation, HistoryEntry, Message, Role, View, derive_title};

use super::command::help;

/// Prompt for the current view.
#[must_use]
pub fn prompt(state: &AppState) -> String {
    match (state.session.view, state.session.username.as_deref()) {
        (View::Chat, Some(username)) => format!("{username}> "),
        (View::Signup, _) => "signup> ".to_string(),
        _ => "login> ".to_string(),
    }
}

/// Banner shown when a view is entered.
///
/// # Errors
/// Returns an error if writing fails.
pub fn view_banner(out: &mut impl Write, state: &AppState) -> io::Result<()> {
    match state.session.view {
        View::Login => writeln!(
            out,
            "Log in with /login <username> <password>, or /signup to register."
        ),
        View::Signup => writeln!(
            out,
            "Create an account with /signup <username> <password>, or /login to go back."
        ),
        View::Chat => {
            let username = state.session.username.as_deref().unwrap_or_default();
            writeln!(out, "Logged in as {username}. Type a question, or /help.")?;
            history(out, &state.chat.history)
        }
    }
}

/// Error and notice lines, if any.
///
/// # Errors
/// Returns an error if writing fails.
pub fn status(out: &mut impl Write, state: &AppState) -> io::Result<()> {
    if let Some(error) = &state.chat.error {
        writeln!(out, "error: {error}")?;
    }
    if let Some(notice) = &state.chat.notice {
        writeln!(out, "* {notice}")?;
    }
    Ok(())
}

/// Sidebar listing.
///
/// # Errors
/// Returns an error if writing fails.
pub fn history(out: &mut impl Write, entries: &[HistoryEntry]) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "No saved chats.");
    }
    writeln!(out, "Saved chats:")?;
    for entry in entries {
        writeln!(out, "  [{}] {}", entry.id, entry.title)?;
    }
    Ok(())
}

/// The whole conversation panel.
///
/// # Errors
/// Returns an error if writing fails.
pub fn conversation(out: &mut impl Write, conversation: Option<&Conversation>) -> io::Result<()> {
    let Some(conversation) = conversation else {
        return writeln!(out, "New conversation.");
    };
    for message in &conversation.messages {
        self::message(out, message)?;
    }
    Ok(())
}

/// A single message.
///
/// # Errors
/// Returns an error if writing fails.
pub fn message(out: &mut impl Write, message: &Message) -> io::Result<()> {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    writeln!(out, "{who}: {}", message.content)
}

/// A stored exchange, as printed by the one-shot commands.
///
/// # Errors
/// Returns an error if writing fails.
pub fn record(out: &mut impl Write, record: &ChatRecord) -> io::Result<()> {
    writeln!(out, "[{}] {}", record.id, derive_title(&record.question))?;
    writeln!(out, "you: {}", record.question)?;
    writeln!(out, "assistant: {}", record.answer)
}

/// Commands available in a view.
///
/// # Errors
/// Returns an error if writing fails.
pub fn commands(out: &mut impl Write, view: View) -> io::Result<()> {
    let entries = help(view);
    let width = entries.iter().map(|(usage, _)| usage.len()).max().unwrap_or(0);
    for (usage, what) in entries {
        writeln!(out, "  {usage:<width$}  {what}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Action, reduce};

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut out = Vec::new();
        f(&mut out).unwrap_or_else(|e| panic!("render failed: {e}"));
        String::from_utf8(out).unwrap_or_else(|e| panic!("not utf-8: {e}"))
    }

    fn chat_record(id: i64, question: &str) -> ChatRecord {
        ChatRecord {
            id,
            question: question.to_string(),
            answer: "forty-two".to_string(),
        }
    }

    #[test]
    fn test_prompt_follows_view() {
        let mut state = AppState::default();
        assert_eq!(prompt(&state), "login> ");
        reduce(&mut state, Action::ShowView(View::Signup));
        assert_eq!(prompt(&state), "signup> ");
        reduce(&mut state, Action::LoggedIn("alice".to_string()));
        assert_eq!(prompt(&state), "alice> ");
    }

    #[test]
    fn test_history_lists_titles() {
        let mut state = AppState::default();
        reduce(&mut state, Action::LoggedIn("alice".to_string()));
        reduce(
            &mut state,
            Action::HistoryLoaded(vec![chat_record(3, "what is the meaning of life really")]),
        );

        let text = render(|out| history(out, &state.chat.history));
        assert!(text.contains("[3] what is the meaning of..."));
        assert_eq!(render(|out| history(out, &[])), "No saved chats.\n");
    }

    #[test]
    fn test_conversation_and_status() {
        let mut state = AppState::default();
        reduce(&mut state, Action::LoggedIn("alice".to_string()));
        reduce(&mut state, Action::ExchangeCompleted(chat_record(1, "question?")));
        reduce(&mut state, Action::RequestFailed("server down".to_string()));

        let text = render(|out| conversation(out, state.chat.current.as_ref()));
        assert_eq!(text, "you: question?\nassistant: forty-two\n");
        assert_eq!(render(|out| status(out, &state)), "error: server down\n");
        assert_eq!(render(|out| conversation(out, None)), "New conversation.\n");
    }

    #[test]
    fn test_commands_are_aligned() {
        let text = render(|out| commands(out, View::Login));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let column = lines[0].find("log in").unwrap_or_else(|| panic!("missing text"));
        assert_eq!(lines[2].find("leave"), Some(column));
    }
}
