//! Voice pipeline: capture with silence detection, decoding and WAVE encoding.

pub mod capture;
pub mod channel;
pub mod decode;
pub mod error;
#[cfg(feature = "microphone")]
pub mod microphone;
pub mod vad;
pub mod wav;

pub use capture::{
    AudioSource, CaptureConfig, CaptureHandle, InputStream, Recording, StopReason, StreamFormat,
    start_capture,
};
pub use channel::{SampleChannel, SampleSender, sample_channel};
pub use decode::{decode_clip, transcode};
pub use error::{AudioError, CaptureError};
#[cfg(feature = "microphone")]
pub use microphone::MicrophoneSource;
pub use vad::{SilenceDetector, VadDecision};
pub use wav::{DecodedAudio, WavHeader, encode_wav};

/// Encode a finished recording for upload.
///
/// # Errors
/// Returns an error if the recording is empty or cannot be encoded.
pub fn recording_to_wav(recording: Recording) -> Result<Vec<u8>, AudioError> {
    let audio = recording.into_decoded()?;
    encode_wav(&audio)
}
