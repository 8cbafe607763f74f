//! Interactive chat session on a terminal.
//!
//! Input lines arrive on a tokio channel fed by a dedicated stdin thread, so
//! a voice capture can race the user's Enter key against its own silence
//! detection.

use std::io::{self, BufRead, Write};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::ChatApi;
use crate::app::ChatApp;
use crate::audio::{AudioSource, CaptureConfig, StopReason, start_capture};
use crate::store::View;

use super::command::{Command, parse};
use super::render;

/// Buffered input lines between the stdin thread and the REPL.
const INPUT_BUFFER: usize = 16;

/// Whether the loop keeps going.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Read stdin line by line on its own thread.
///
/// The channel closes at end of input.
///
/// # Errors
/// Returns an error if the thread cannot be spawned.
pub fn spawn_stdin_reader() -> io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    std::thread::Builder::new()
        .name("chatvox-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        })?;
    Ok(rx)
}

/// Run the session until `/quit` or end of input.
///
/// Operation failures are shown and the loop continues; only output errors end it.
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub async fn run<A, W>(
    app: &mut ChatApp<A>,
    capture: &CaptureConfig,
    input: &mut mpsc::Receiver<String>,
    out: &mut W,
) -> io::Result<()>
where
    A: ChatApi,
    W: Write,
{
    render::view_banner(out, app.state())?;
    loop {
        write!(out, "{}", render::prompt(app.state()))?;
        out.flush()?;

        let Some(line) = input.recv().await else {
            writeln!(out)?;
            break;
        };

        let view = app.state().session.view;
        let command = match parse(view, &line) {
            Ok(command) => command,
            Err(err) => {
                writeln!(out, "error: {err}")?;
                continue;
            }
        };

        if execute(app, capture, input, out, command).await? == Flow::Quit {
            break;
        }

        render::status(out, app.state())?;
        app.dismiss_error();
        if app.state().session.view != view {
            render::view_banner(out, app.state())?;
        }
    }
    info!("Session ended");
    Ok(())
}

async fn execute<A, W>(
    app: &mut ChatApp<A>,
    capture: &CaptureConfig,
    input: &mut mpsc::Receiver<String>,
    out: &mut W,
    command: Command,
) -> io::Result<Flow>
where
    A: ChatApi,
    W: Write,
{
    match command {
        Command::Empty => {}
        Command::Quit => return Ok(Flow::Quit),
        Command::Help => render::commands(out, app.state().session.view)?,
        Command::ShowLogin => app.show_view(View::Login),
        Command::ShowSignup => app.show_view(View::Signup),
        Command::Login { username, password } => {
            let _ = app.login(&username, &password).await;
        }
        Command::Signup { username, password } => {
            let _ = app.signup(&username, &password).await;
        }
        Command::Logout => app.logout(),
        Command::Send(text) => send(app, out, Some(text)).await?,
        Command::SendDraft => send(app, out, None).await?,
        Command::List => {
            if app.refresh_history().await.is_ok() {
                render::history(out, &app.state().chat.history)?;
            }
        }
        Command::Open(id) => {
            if app.open_chat(id).await.is_ok() {
                render::conversation(out, app.state().chat.current.as_ref())?;
            }
        }
        Command::New => {
            app.new_conversation();
            render::conversation(out, None)?;
        }
        Command::Delete(id) => {
            if app.delete_chat(id).await.is_ok() {
                writeln!(out, "Deleted chat {id}.")?;
            }
        }
        Command::Clear => {
            if app.clear_history().await.is_ok() {
                writeln!(out, "All chats deleted.")?;
            }
        }
        Command::Voice => voice(app, capture, input, out).await?,
        Command::VoiceFile(path) => {
            writeln!(out, "Transcribing {}...", path.display())?;
            out.flush()?;
            if let Ok(text) = app.transcribe_file(&path).await {
                draft_ready(out, &text)?;
            }
        }
    }
    Ok(Flow::Continue)
}

async fn send<A, W>(app: &mut ChatApp<A>, out: &mut W, text: Option<String>) -> io::Result<()>
where
    A: ChatApi,
    W: Write,
{
    writeln!(out, "(waiting for the assistant...)")?;
    out.flush()?;
    let result = match text {
        Some(text) => app.send_message(&text).await,
        None => app.send_draft().await,
    };
    if let Ok(record) = result {
        writeln!(out, "assistant: {}", record.answer)?;
    }
    Ok(())
}

fn draft_ready(out: &mut impl Write, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return writeln!(out, "Nothing was recognised.");
    }
    writeln!(out, "draft: {text}")?;
    writeln!(out, "Type /send to send it, or type a new message.")
}

#[cfg(feature = "microphone")]
async fn voice<A, W>(
    app: &mut ChatApp<A>,
    capture: &CaptureConfig,
    input: &mut mpsc::Receiver<String>,
    out: &mut W,
) -> io::Result<()>
where
    A: ChatApi,
    W: Write,
{
    let mut source = crate::audio::MicrophoneSource::new();
    record(app, &mut source, capture.clone(), input, out).await
}

#[cfg(not(feature = "microphone"))]
async fn voice<A, W>(
    app: &mut ChatApp<A>,
    _capture: &CaptureConfig,
    _input: &mut mpsc::Receiver<String>,
    _out: &mut W,
) -> io::Result<()>
where
    A: ChatApi,
    W: Write,
{
    app.report(crate::audio::CaptureError::Unsupported);
    Ok(())
}

/// Record from `source` until Enter, silence or the ceiling, then transcribe into the draft.
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub async fn record<A, S, W>(
    app: &mut ChatApp<A>,
    source: &mut S,
    config: CaptureConfig,
    input: &mut mpsc::Receiver<String>,
    out: &mut W,
) -> io::Result<()>
where
    A: ChatApi,
    S: AudioSource,
    W: Write,
{
    let mut handle = match start_capture(source, config) {
        Ok(handle) => handle,
        Err(err) => {
            app.report(err);
            return Ok(());
        }
    };
    writeln!(out, "Recording... press Enter to stop.")?;
    out.flush()?;

    let result = tokio::select! {
        result = handle.wait() => result,
        line = input.recv() => match line {
            Some(_) => handle.finish().await,
            // Input closed: only silence or the ceiling can end this recording.
            None => handle.wait().await,
        },
    };

    let recording = match result {
        Ok(recording) => recording,
        Err(err) => {
            app.report(err);
            return Ok(());
        }
    };

    let why = match recording.stop_reason {
        StopReason::Manual => "stopped",
        StopReason::Silence => "silence detected",
        StopReason::MaxDuration => "time limit reached",
    };
    writeln!(
        out,
        "Captured {:.1}s ({why}), transcribing...",
        recording.duration().as_secs_f64()
    )?;
    out.flush()?;

    if let Ok(text) = app.transcribe_recording(recording).await {
        draft_ready(out, &text)?;
    }
    Ok(())
}
