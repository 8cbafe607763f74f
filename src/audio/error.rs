//! Error types for the voice pipeline.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while decoding or encoding audio.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The container or codec could not be read.
    #[error("could not decode audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),
    /// The container holds no decodable audio track.
    #[error("no audio track found")]
    NoAudioTrack,
    /// Decoding produced no samples.
    #[error("audio clip is empty")]
    EmptyClip,
    /// Audio with zero channels cannot be encoded.
    #[error("audio has no channels")]
    NoChannels,
    /// More channels than a WAVE header can describe.
    #[error("too many channels: {0}")]
    TooManyChannels(usize),
    /// Sample rate of zero.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),
    /// Channel buffers of different lengths.
    #[error("channel {channel} has {found} samples, expected {expected}")]
    ChannelLengthMismatch {
        /// Index of the offending channel.
        channel: usize,
        /// Length of channel 0.
        expected: usize,
        /// Length of the offending channel.
        found: usize,
    },
    /// Sample data would overflow the 32-bit RIFF size fields.
    #[error("audio too long for a WAVE container ({0} data bytes)")]
    TooLong(usize),
    /// Bytes are not a canonical PCM WAVE file.
    #[error("malformed WAVE header: {0}")]
    MalformedHeader(String),
}

/// Errors raised while acquiring or running an input device.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No input device exists.
    #[error("no microphone found")]
    NoDevice,
    /// The device exists but could not be opened (permission denied, busy, ...).
    #[error("microphone access failed: {0}")]
    AccessDenied(String),
    /// The device offers no sample format we can read.
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),
    /// The running stream failed.
    #[error("input stream error: {0}")]
    Stream(String),
    /// The capture task panicked or was cancelled.
    #[error("capture task failed: {0}")]
    Task(String),
    /// The capture has already been collected.
    #[error("capture already finished")]
    AlreadyFinished,
    /// The capture settings are out of range.
    #[error("invalid capture settings: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// Microphone support was not compiled in.
    #[error("microphone support is not enabled in this build")]
    Unsupported,
}
