//! Parsing of REPL input lines into commands.
//!
//! Which commands are accepted depends on the current [`View`]. Plain text is
//! a message in the chat view and an error elsewhere.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::View;

/// A parsed REPL line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Blank line.
    Empty,
    /// Log in with these credentials.
    Login {
        /// Account name.
        username: String,
        /// Password.
        password: String,
    },
    /// Create an account.
    Signup {
        /// Account name.
        username: String,
        /// Password.
        password: String,
    },
    /// Switch to the login form.
    ShowLogin,
    /// Switch to the signup form.
    ShowSignup,
    /// Send this text.
    Send(String),
    /// Send the current draft.
    SendDraft,
    /// Reload and print the history.
    List,
    /// Open a saved chat.
    Open(i64),
    /// Start a new conversation.
    New,
    /// Delete a saved chat.
    Delete(i64),
    /// Delete all saved chats.
    Clear,
    /// Record from the microphone.
    Voice,
    /// Transcribe an audio file.
    VoiceFile(PathBuf),
    /// End the session.
    Logout,
    /// Show the commands of the current view.
    Help,
    /// Leave the program.
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The command name is not known.
    #[error("unknown command /{0}, type /help for the list")]
    Unknown(String),
    /// The command exists but not on this screen.
    #[error("/{0} is not available here, type /help for the list")]
    NotAvailable(String),
    /// A required argument is missing.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// A chat id is not a number.
    #[error("invalid chat id: {0}")]
    InvalidId(String),
    /// Free text outside the chat view.
    #[error("log in first, type /help for the list")]
    NotLoggedIn,
}

/// Parse one input line for the given view.
///
/// # Errors
/// Returns a [`ParseError`] describing what is wrong with the line.
pub fn parse(view: View, line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return match view {
            View::Chat => Ok(Command::Send(line.to_string())),
            View::Login | View::Signup => Err(ParseError::NotLoggedIn),
        };
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    match name {
        "quit" | "exit" => return Ok(Command::Quit),
        "help" => return Ok(Command::Help),
        _ => {}
    }

    match view {
        View::Login | View::Signup => parse_auth(view, name, args),
        View::Chat => parse_chat(name, args),
    }
}

fn parse_auth(view: View, name: &str, args: &str) -> Result<Command, ParseError> {
    match (name, view) {
        ("login", View::Signup) if args.is_empty() => Ok(Command::ShowLogin),
        ("signup", View::Login) if args.is_empty() => Ok(Command::ShowSignup),
        ("login", _) => {
            let (username, password) =
                credentials(args).ok_or(ParseError::Usage("/login <username> <password>"))?;
            Ok(Command::Login { username, password })
        }
        ("signup", _) => {
            let (username, password) =
                credentials(args).ok_or(ParseError::Usage("/signup <username> <password>"))?;
            Ok(Command::Signup { username, password })
        }
        (other, _) if is_chat_command(other) => Err(ParseError::NotAvailable(other.to_string())),
        (other, _) => Err(ParseError::Unknown(other.to_string())),
    }
}

fn parse_chat(name: &str, args: &str) -> Result<Command, ParseError> {
    match name {
        "list" => Ok(Command::List),
        "open" => chat_id(args, "/open <id>").map(Command::Open),
        "new" => Ok(Command::New),
        "delete" => chat_id(args, "/delete <id>").map(Command::Delete),
        "clear" => Ok(Command::Clear),
        "voice" => Ok(Command::Voice),
        "voice-file" if args.is_empty() => Err(ParseError::Usage("/voice-file <path>")),
        "voice-file" => Ok(Command::VoiceFile(PathBuf::from(args))),
        "send" => Ok(Command::SendDraft),
        "logout" => Ok(Command::Logout),
        "login" | "signup" => Err(ParseError::NotAvailable(name.to_string())),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

fn is_chat_command(name: &str) -> bool {
    matches!(
        name,
        "list" | "open" | "new" | "delete" | "clear" | "voice" | "voice-file" | "send" | "logout"
    )
}

/// Split `<username> <password>`; the password is the rest of the line.
fn credentials(args: &str) -> Option<(String, String)> {
    let (username, password) = args.split_once(char::is_whitespace)?;
    let password = password.trim();
    if password.is_empty() {
        return None;
    }
    Some((username.to_string(), password.to_string()))
}

fn chat_id(args: &str, usage: &'static str) -> Result<i64, ParseError> {
    if args.is_empty() {
        return Err(ParseError::Usage(usage));
    }
    args.parse()
        .map_err(|_| ParseError::InvalidId(args.to_string()))
}

/// Help text for a view, one command per line.
#[must_use]
pub fn help(view: View) -> &'static [(&'static str, &'static str)] {
    match view {
        View::Login => &[
            ("/login <username> <password>", "log in"),
            ("/signup", "create an account instead"),
            ("/quit", "leave"),
        ],
        View::Signup => &[
            ("/signup <username> <password>", "create an account"),
            ("/login", "back to login"),
            ("/quit", "leave"),
        ],
        View::Chat => &[
            ("<text>", "ask the assistant"),
            ("/send", "send the current draft"),
            ("/voice", "record a question, Enter stops"),
            ("/voice-file <path>", "transcribe an audio file into the draft"),
            ("/list", "show saved chats"),
            ("/open <id>", "open a saved chat"),
            ("/new", "start a new conversation"),
            ("/delete <id>", "delete a saved chat"),
            ("/clear", "delete all saved chats"),
            ("/logout", "log out"),
            ("/quit", "leave"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message_in_chat() {
        assert_eq!(
            parse(View::Chat, "  What is Rust?  "),
            Ok(Command::Send("What is Rust?".to_string()))
        );
        assert_eq!(parse(View::Login, "hello"), Err(ParseError::NotLoggedIn));
        assert_eq!(parse(View::Chat, "   "), Ok(Command::Empty));
    }

    #[test]
    fn test_login_takes_rest_of_line_as_password() {
        assert_eq!(
            parse(View::Login, "/login alice correct horse"),
            Ok(Command::Login {
                username: "alice".to_string(),
                password: "correct horse".to_string(),
            })
        );
        assert_eq!(
            parse(View::Login, "/login alice"),
            Err(ParseError::Usage("/login <username> <password>"))
        );
        assert_eq!(
            parse(View::Login, "/login"),
            Err(ParseError::Usage("/login <username> <password>"))
        );
    }

    #[test]
    fn test_switching_between_forms() {
        assert_eq!(parse(View::Login, "/signup"), Ok(Command::ShowSignup));
        assert_eq!(parse(View::Signup, "/login"), Ok(Command::ShowLogin));
        assert_eq!(
            parse(View::Signup, "/signup bob pw"),
            Ok(Command::Signup {
                username: "bob".to_string(),
                password: "pw".to_string(),
            })
        );
    }

    #[test]
    fn test_chat_commands() {
        assert_eq!(parse(View::Chat, "/list"), Ok(Command::List));
        assert_eq!(parse(View::Chat, "/open 12"), Ok(Command::Open(12)));
        assert_eq!(parse(View::Chat, "/delete 3"), Ok(Command::Delete(3)));
        assert_eq!(parse(View::Chat, "/voice"), Ok(Command::Voice));
        assert_eq!(parse(View::Chat, "/send"), Ok(Command::SendDraft));
        assert_eq!(
            parse(View::Chat, "/voice-file clips/my question.ogg"),
            Ok(Command::VoiceFile(PathBuf::from("clips/my question.ogg")))
        );
    }

    #[test]
    fn test_invalid_chat_arguments() {
        assert_eq!(
            parse(View::Chat, "/open abc"),
            Err(ParseError::InvalidId("abc".to_string()))
        );
        assert_eq!(
            parse(View::Chat, "/delete"),
            Err(ParseError::Usage("/delete <id>"))
        );
        assert_eq!(
            parse(View::Chat, "/voice-file"),
            Err(ParseError::Usage("/voice-file <path>"))
        );
    }

    #[test]
    fn test_commands_outside_their_view() {
        assert_eq!(
            parse(View::Login, "/list"),
            Err(ParseError::NotAvailable("list".to_string()))
        );
        assert_eq!(
            parse(View::Chat, "/login a b"),
            Err(ParseError::NotAvailable("login".to_string()))
        );
        assert_eq!(
            parse(View::Chat, "/dance"),
            Err(ParseError::Unknown("dance".to_string()))
        );
    }

    #[test]
    fn test_quit_and_help_everywhere() {
        for view in [View::Login, View::Signup, View::Chat] {
            assert_eq!(parse(view, "/quit"), Ok(Command::Quit));
            assert_eq!(parse(view, "/help"), Ok(Command::Help));
            assert!(!help(view).is_empty());
        }
    }
}
