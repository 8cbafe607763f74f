//! Binary entrypoint for the chatvox terminal client.

use std::process::ExitCode;

use chatvox::start_chatvox;

/// Parse arguments and run the selected command.
fn main() -> ExitCode {
    start_chatvox::run()
}
