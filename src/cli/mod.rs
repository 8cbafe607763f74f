//! Terminal front end: argument parsing, the interactive session and rendering.

pub mod args;
pub mod command;
pub mod render;
pub mod repl;

pub use args::{Cli, Commands};
pub use command::{Command, ParseError, parse};
