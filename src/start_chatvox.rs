//! Startup helpers for the chatvox binary.

use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use crate::api::{ChatApi, ChatApiClient};
use crate::app::ChatApp;
use crate::audio::{decode_clip, encode_wav};
use crate::cli::{Cli, Commands, render, repl};
use crate::config::ClientConfig;

/// Parse arguments, install logging and run the chosen subcommand.
///
/// # Returns
/// `ExitCode::SUCCESS` when the command completes, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    tracing::debug!("Starting chatvox v{}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(dispatch(cli)) {
        tracing::error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Load configuration, applying command-line overrides.
///
/// # Errors
/// Returns an error if the environment holds invalid values.
pub fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("invalid environment")?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url.clone());
        config.validate().context("invalid --api-url")?;
    }
    Ok(config)
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let command = cli.command();
    if let Commands::Transcode { input, output } = &command {
        return transcode_file(input, output, &mut io::stdout().lock());
    }

    let config = load_config(&cli)?;
    tracing::info!("Assistant server: {}", config.api.base_url);
    let client = ChatApiClient::new(config.api.clone()).context("failed to build HTTP client")?;
    let mut out = io::stdout().lock();

    match command {
        Commands::Chat => {
            let mut input = repl::spawn_stdin_reader().context("failed to read stdin")?;
            let mut app = ChatApp::new(client);
            repl::run(&mut app, &config.capture, &mut input, &mut out).await?;
        }
        Commands::Ask { username, question } => {
            ask(&client, &username, &question.join(" "), &mut out).await?;
        }
        Commands::Chats { username } => {
            let records = client.list_chats(&username).await?;
            for record in &records {
                render::record(&mut out, record)?;
            }
            if records.is_empty() {
                writeln!(out, "No saved chats.")?;
            }
        }
        Commands::Transcode { .. } => {}
    }
    Ok(())
}

async fn ask<A: ChatApi>(
    api: &A,
    username: &str,
    question: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("question is empty");
    }
    let record = api
        .send_message(username, question.trim())
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    writeln!(out, "{}", record.answer)?;
    Ok(())
}

/// Convert any supported audio file into a canonical WAV file.
///
/// # Errors
/// Returns an error if reading, decoding, encoding or writing fails.
pub fn transcode_file(input: &Path, output: &Path, out: &mut impl Write) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let audio =
        decode_clip(&bytes).with_context(|| format!("failed to decode {}", input.display()))?;
    let wav = encode_wav(&audio)?;
    std::fs::write(output, &wav)
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        bytes = wav.len(),
        "Transcoded"
    );
    writeln!(
        out,
        "Wrote {} ({} ch, {} Hz, {:.2}s)",
        output.display(),
        audio.channel_count(),
        audio.sample_rate,
        audio.duration().as_secs_f64()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::app::testing::FakeApi;
    use crate::audio::{DecodedAudio, WavHeader};

    #[test]
    fn test_transcode_file_writes_wav() {
        let dir = std::env::temp_dir();
        let input = dir.join(format!("chatvox-in-{}.wav", Uuid::new_v4()));
        let output = dir.join(format!("chatvox-out-{}.wav", Uuid::new_v4()));
        let audio = DecodedAudio::new(22_050, vec![vec![0.5; 2_205]]);
        let source = encode_wav(&audio).unwrap_or_else(|e| panic!("encode failed: {e}"));
        std::fs::write(&input, &source).unwrap_or_else(|e| panic!("write failed: {e}"));

        let mut out = Vec::new();
        let result = transcode_file(&input, &output, &mut out);
        let written = std::fs::read(&output);
        let _ = std::fs::remove_file(&input);
        let _ = std::fs::remove_file(&output);

        result.unwrap_or_else(|e| panic!("transcode failed: {e:#}"));
        let written = written.unwrap_or_else(|e| panic!("read failed: {e}"));
        let header = WavHeader::parse(&written).unwrap_or_else(|e| panic!("bad header: {e}"));
        assert_eq!(header.sample_rate, 22_050);
        assert_eq!(header.channels, 1);
        assert_eq!(written.len(), source.len());

        let text = String::from_utf8(out).unwrap_or_else(|e| panic!("not utf-8: {e}"));
        assert!(text.contains("1 ch, 22050 Hz, 0.10s"));
    }

    #[test]
    fn test_transcode_missing_input_fails() {
        let input = std::env::temp_dir().join(format!("chatvox-none-{}.ogg", Uuid::new_v4()));
        let output = std::env::temp_dir().join(format!("chatvox-none-{}.wav", Uuid::new_v4()));
        let result = transcode_file(&input, &output, &mut Vec::new());
        assert!(result.is_err());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_ask_prints_answer() {
        let api = FakeApi::default();
        let mut out = Vec::new();
        ask(&api, "alice", "  ping  ", &mut out)
            .await
            .unwrap_or_else(|e| panic!("ask failed: {e:#}"));
        assert_eq!(String::from_utf8_lossy(&out), "echo: ping\n");

        assert!(ask(&api, "alice", "   ", &mut Vec::new()).await.is_err());
        assert!(ask(&FakeApi::offline(), "alice", "hi", &mut Vec::new()).await.is_err());
    }
}
