//! Canonical 16-bit PCM WAVE encoding.
//!
//! The speech endpoint only accepts this exact layout: a 44-byte RIFF header
//! (format tag 1, 16 bits per sample) followed by interleaved little-endian
//! samples.

use std::time::Duration;

use super::error::AudioError;

/// Size of the canonical header written by [`encode_wav`].
pub const WAV_HEADER_LEN: usize = 44;

/// Linear PCM format tag.
const FORMAT_PCM: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = 2;

/// Decoded audio as one floating-point buffer per channel.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// One buffer per channel, nominally in `[-1, 1]`.
    pub channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    /// Bundle channel buffers with their sample rate.
    #[must_use]
    pub const fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Split an interleaved buffer into per-channel buffers. A trailing partial frame is dropped.
    #[must_use]
    pub fn from_interleaved(sample_rate: u32, channel_count: u16, interleaved: &[f32]) -> Self {
        let count = usize::from(channel_count.max(1));
        let frames = interleaved.len() / count;
        let mut channels = vec![Vec::with_capacity(frames); count];
        for frame in interleaved.chunks_exact(count) {
            for (buffer, sample) in channels.iter_mut().zip(frame) {
                buffer.push(*sample);
            }
        }
        Self::new(sample_rate, channels)
    }

    /// Number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel).
    #[must_use]
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Playback length.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    /// Check that the buffers can be written as a WAVE container.
    ///
    /// # Errors
    /// Returns an error for zero channels, a zero sample rate, or ragged channels.
    pub fn validate(&self) -> Result<(), AudioError> {
        if self.channels.is_empty() {
            return Err(AudioError::NoChannels);
        }
        if u16::try_from(self.channels.len()).is_err() {
            return Err(AudioError::TooManyChannels(self.channels.len()));
        }
        if self.sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(self.sample_rate));
        }
        let expected = self.frames();
        for (channel, buffer) in self.channels.iter().enumerate() {
            if buffer.len() != expected {
                return Err(AudioError::ChannelLengthMismatch {
                    channel,
                    expected,
                    found: buffer.len(),
                });
            }
        }
        Ok(())
    }
}

/// Quantise one sample to a signed 16-bit value.
///
/// Out-of-range input is clamped to `[-1, 1]` first; negatives scale by 32768,
/// the rest by 32767. NaN encodes as silence.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn quantize(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    scaled.round() as i16
}

/// Encode decoded audio as a canonical PCM WAVE container.
///
/// # Errors
/// Returns an error if the audio fails [`DecodedAudio::validate`] or is too long
/// for 32-bit size fields.
pub fn encode_wav(audio: &DecodedAudio) -> Result<Vec<u8>, AudioError> {
    audio.validate()?;

    let channel_count = u16::try_from(audio.channel_count())
        .map_err(|_| AudioError::TooManyChannels(audio.channel_count()))?;
    let frames = audio.frames();
    let data_len = frames * audio.channel_count() * BYTES_PER_SAMPLE;
    let data_bytes = u32::try_from(data_len).map_err(|_| AudioError::TooLong(data_len))?;
    let chunk_size = data_bytes
        .checked_add(36)
        .ok_or(AudioError::TooLong(data_len))?;
    let block_align = channel_count
        .checked_mul(2)
        .ok_or(AudioError::TooManyChannels(audio.channel_count()))?;
    let byte_rate = audio
        .sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or(AudioError::InvalidSampleRate(audio.sample_rate))?;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&chunk_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16_u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&channel_count.to_le_bytes());
    out.extend_from_slice(&audio.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_bytes.to_le_bytes());

    for frame in 0..frames {
        for channel in &audio.channels {
            out.extend_from_slice(&quantize(channel[frame]).to_le_bytes());
        }
    }

    Ok(out)
}

/// Fields of a canonical PCM WAVE header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavHeader {
    /// RIFF chunk size (`36 + data_bytes`).
    pub chunk_size: u32,
    /// Format tag (1 for PCM).
    pub format_tag: u16,
    /// Channel count.
    pub channels: u16,
    /// Sample rate.
    pub sample_rate: u32,
    /// Bytes per second.
    pub byte_rate: u32,
    /// Bytes per frame.
    pub block_align: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Size of the sample data.
    pub data_bytes: u32,
}

impl WavHeader {
    /// Read the 44-byte header written by [`encode_wav`].
    ///
    /// # Errors
    /// Returns an error if the bytes are too short or the chunk ids do not match.
    pub fn parse(bytes: &[u8]) -> Result<Self, AudioError> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(AudioError::MalformedHeader(format!(
                "expected at least {WAV_HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        for (offset, tag) in [(0, b"RIFF"), (8, b"WAVE"), (12, b"fmt "), (36, b"data")] {
            if &bytes[offset..offset + 4] != tag {
                return Err(AudioError::MalformedHeader(format!(
                    "missing {:?} at offset {offset}",
                    String::from_utf8_lossy(tag)
                )));
            }
        }
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Ok(Self {
            chunk_size: u32_at(4),
            format_tag: u16_at(20),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_bytes: u32_at(40),
        })
    }
}
