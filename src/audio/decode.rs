//! Decoding of compressed or containerised clips into per-channel samples.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::error::AudioError;
use super::wav::{DecodedAudio, encode_wav};

/// Decode a clip in any container/codec symphonia understands.
///
/// Corrupt packets are skipped; the first decoded packet fixes the channel
/// layout and sample rate.
///
/// # Errors
/// Returns an error if the container format is not recognised, holds no audio track,
/// or yields no samples.
pub fn decode_clip(bytes: &[u8]) -> Result<DecodedAudio, AudioError> {
    let source = MediaSourceStream::new(
        Box::new(Cursor::new(bytes.to_vec())),
        MediaSourceStreamOptions::default(),
    );
    let detected = symphonia::default::get_probe().format(
        &Hint::new(),
        source,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = detected.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoAudioTrack)?;
    let track_id = track.id;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut skipped = 0_usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(err.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                skipped += 1;
                tracing::debug!(reason, "skipping corrupt audio packet");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let spec = *decoded.spec();
        let count = spec.channels.count();
        if count == 0 {
            continue;
        }
        if channels.is_empty() {
            channels = vec![Vec::new(); count];
            sample_rate = spec.rate;
        }

        let capacity = u64::try_from(decoded.capacity()).unwrap_or(u64::MAX);
        let mut buffer = SampleBuffer::<f32>::new(capacity, spec);
        buffer.copy_interleaved_ref(decoded);
        for frame in buffer.samples().chunks_exact(count) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "some audio packets could not be decoded");
    }

    let audio = DecodedAudio::new(sample_rate, channels);
    if audio.channel_count() == 0 || audio.frames() == 0 {
        return Err(AudioError::EmptyClip);
    }
    audio.validate()?;
    Ok(audio)
}

/// Decode a clip and re-encode it as canonical 16-bit PCM WAVE.
///
/// # Errors
/// Returns an error if decoding or encoding fails.
pub fn transcode(bytes: &[u8]) -> Result<Vec<u8>, AudioError> {
    let audio = decode_clip(bytes)?;
    tracing::debug!(
        sample_rate = audio.sample_rate,
        channels = audio.channel_count(),
        frames = audio.frames(),
        "transcoding clip to PCM WAVE"
    );
    encode_wav(&audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::{WAV_HEADER_LEN, WavHeader};

    /// Rounding plus the asymmetric positive/negative scale factors.
    const QUANTIZATION_TOLERANCE: f32 = 2.0 / 32768.0;

    #[allow(clippy::cast_precision_loss)]
    fn sine(frames: usize, freq: f32, rate: u32, amplitude: f32) -> Vec<f32> {
        (0..frames)
            .map(|i| {
                let t = i as f32 / rate as f32;
                amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    fn assert_close(left: &[f32], right: &[f32]) {
        assert_eq!(left.len(), right.len());
        for (i, (a, b)) in left.iter().zip(right).enumerate() {
            assert!(
                (a - b).abs() <= QUANTIZATION_TOLERANCE,
                "sample {i}: {a} vs {b}"
            );
        }
    }

    #[test]
    fn test_round_trip_mono() {
        let original = DecodedAudio::new(16_000, vec![sine(4_000, 440.0, 16_000, 0.8)]);
        let wav = encode_wav(&original).unwrap_or_else(|e| panic!("encode failed: {e}"));
        let decoded = decode_clip(&wav).unwrap_or_else(|e| panic!("decode failed: {e}"));

        assert_eq!(decoded.sample_rate, 16_000);
        assert_eq!(decoded.channel_count(), 1);
        assert_close(&decoded.channels[0], &original.channels[0]);
    }

    #[test]
    fn test_round_trip_stereo() {
        let original = DecodedAudio::new(
            44_100,
            vec![
                sine(2_048, 220.0, 44_100, 0.5),
                sine(2_048, 660.0, 44_100, -0.9),
            ],
        );
        let wav = encode_wav(&original).unwrap_or_else(|e| panic!("encode failed: {e}"));
        let decoded = decode_clip(&wav).unwrap_or_else(|e| panic!("decode failed: {e}"));

        assert_eq!(decoded.sample_rate, 44_100);
        assert_eq!(decoded.channel_count(), 2);
        assert_close(&decoded.channels[0], &original.channels[0]);
        assert_close(&decoded.channels[1], &original.channels[1]);
    }

    #[test]
    fn test_transcode_preserves_layout() {
        let original = DecodedAudio::new(8_000, vec![sine(800, 300.0, 8_000, 0.3)]);
        let wav = encode_wav(&original).unwrap_or_else(|e| panic!("encode failed: {e}"));
        let again = transcode(&wav).unwrap_or_else(|e| panic!("transcode failed: {e}"));

        assert_eq!(again.len(), wav.len());
        assert_eq!(&again[..WAV_HEADER_LEN], &wav[..WAV_HEADER_LEN]);
        let header = WavHeader::parse(&again).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(header.data_bytes, 1_600);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(decode_clip(b"definitely not audio").is_err());
        assert!(transcode(&[]).is_err());
    }

    #[test]
    fn test_header_only_wav_is_empty() {
        let empty = encode_wav(&DecodedAudio::new(8_000, vec![Vec::new()]))
            .unwrap_or_else(|e| panic!("encode failed: {e}"));
        assert!(decode_clip(&empty).is_err());
    }
}
