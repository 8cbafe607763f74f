//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Terminal client for a remote chat assistant with voice input.
#[derive(Parser, Debug)]
#[command(name = "chatvox")]
#[command(author, version, about = "Chat with a remote assistant, by keyboard or by voice")]
#[command(long_about = r#"
chatvox talks to an assistant server that stores chats and transcribes speech.

Without a subcommand an interactive session starts. Voice questions are
recorded until you press Enter, stop talking for a moment, or reach the
recording limit; the transcription lands in the draft for you to send.

Environment:
  CHATVOX_API_URL             server base URL (default http://127.0.0.1:8000)
  CHATVOX_TIMEOUT_SECS        request timeout
  CHATVOX_SILENCE_THRESHOLD   RMS level counted as silence (default 0.02)
  CHATVOX_SILENCE_TIMEOUT_MS  silence that ends a recording (default 1500)
  CHATVOX_MAX_RECORDING_SECS  recording limit (default 15)
  RUST_LOG                    log filter, logs go to stderr

Example:
  chatvox
  chatvox ask --username alice "What is the capital of Peru?"
  chatvox transcode memo.ogg memo.wav
"#)]
pub struct Cli {
    /// Assistant server base URL (overrides CHATVOX_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// What to do (defaults to an interactive session)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start an interactive session
    Chat,

    /// Ask a single question and print the answer
    Ask {
        /// Account the exchange is stored under
        #[arg(long, short)]
        username: String,

        /// The question; several words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// List the saved chats of a user
    Chats {
        /// Account to list
        #[arg(long, short)]
        username: String,
    },

    /// Convert an audio file to 16-bit PCM WAV without contacting the server
    Transcode {
        /// Input file in any supported container (WAV, OGG, FLAC, MKV/WebM, ...)
        input: PathBuf,

        /// Where to write the WAV file
        output: PathBuf,
    },
}

impl Cli {
    /// The subcommand to run, with the interactive session as default.
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn test_defaults_to_chat() {
        let cli = parse(&["chatvox"]);
        assert_eq!(cli.command(), Commands::Chat);
        assert!(cli.api_url.is_none());
    }

    #[test]
    fn test_ask_joins_words() {
        let cli = parse(&[
            "chatvox",
            "--api-url",
            "http://assistant:9000",
            "ask",
            "-u",
            "alice",
            "what",
            "is",
            "rust",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://assistant:9000"));
        assert_eq!(
            cli.command(),
            Commands::Ask {
                username: "alice".to_string(),
                question: vec!["what".to_string(), "is".to_string(), "rust".to_string()],
            }
        );
    }

    #[test]
    fn test_transcode_takes_two_paths() {
        let cli = parse(&["chatvox", "transcode", "in.ogg", "out.wav"]);
        assert_eq!(
            cli.command(),
            Commands::Transcode {
                input: PathBuf::from("in.ogg"),
                output: PathBuf::from("out.wav"),
            }
        );
        assert!(Cli::try_parse_from(["chatvox", "transcode", "in.ogg"]).is_err());
    }

    #[test]
    fn test_ask_requires_username() {
        assert!(Cli::try_parse_from(["chatvox", "ask", "hello"]).is_err());
    }
}
