//! Voice capture that stops itself on silence.
//!
//! A capture session opens an [`AudioSource`], then a single tokio task polls
//! the stream at a fixed interval, measures the loudness of the latest window
//! and stops on the first of:
//! - a manual stop through [`CaptureHandle::stop`],
//! - enough consecutive quiet polls ([`StopReason::Silence`]),
//! - the hard recording ceiling ([`StopReason::MaxDuration`]).
//!
//! The input stream is owned by the task, so it is released on every exit
//! path: normal stop, stream error, or the handle being dropped mid-capture.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info};
use uuid::Uuid;

use super::error::{AudioError, CaptureError};
use super::vad::{SilenceDetector, VadDecision, downmix_tail, rms};
use super::wav::DecodedAudio;
use crate::config::{ConfigError, duration_serde};

/// Settings for a capture session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CaptureConfig {
    /// Interval between loudness polls.
    #[serde(with = "duration_serde")]
    pub poll_interval: Duration,
    /// RMS level (on the `[-1, 1]` scale) below which a poll counts as quiet.
    pub silence_threshold: f32,
    /// Accumulated quiet time that ends the capture.
    #[serde(with = "duration_serde")]
    pub silence_timeout: Duration,
    /// Hard ceiling on recording length.
    #[serde(with = "duration_serde")]
    pub max_duration: Duration,
    /// Number of most recent frames the loudness is measured over.
    pub analysis_window: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            silence_threshold: 0.02,
            silence_timeout: Duration::from_millis(1500),
            max_duration: Duration::from_secs(15),
            analysis_window: 2048,
        }
    }
}

impl CaptureConfig {
    /// Set the silence threshold.
    #[must_use]
    pub const fn with_silence_threshold(mut self, threshold: f32) -> Self {
        self.silence_threshold = threshold;
        self
    }

    /// Set the silence timeout.
    #[must_use]
    pub const fn with_silence_timeout(mut self, timeout: Duration) -> Self {
        self.silence_timeout = timeout;
        self
    }

    /// Set the recording ceiling.
    #[must_use]
    pub const fn with_max_duration(mut self, max: Duration) -> Self {
        self.max_duration = max;
        self
    }

    /// Set the analysis window in frames.
    #[must_use]
    pub const fn with_analysis_window(mut self, frames: usize) -> Self {
        self.analysis_window = frames;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "capture.poll_interval must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.silence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "capture.silence_threshold must be within [0, 1], got {}",
                self.silence_threshold
            )));
        }
        if self.silence_timeout < self.poll_interval {
            return Err(ConfigError::Invalid(
                "capture.silence_timeout must be >= capture.poll_interval".to_string(),
            ));
        }
        if self.max_duration.is_zero() {
            return Err(ConfigError::Invalid(
                "capture.max_duration must be > 0".to_string(),
            ));
        }
        if self.analysis_window == 0 {
            return Err(ConfigError::Invalid(
                "capture.analysis_window must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    fn detector(&self) -> SilenceDetector {
        SilenceDetector::new(
            self.silence_threshold,
            self.poll_interval,
            self.silence_timeout,
        )
    }
}

/// Sample layout of an input stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamFormat {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

/// Something that can be opened for recording, typically a microphone.
pub trait AudioSource: Send {
    /// Acquire the device and start delivering samples.
    ///
    /// # Errors
    /// Returns an error if the device is missing or access is refused.
    fn open(&mut self) -> Result<Box<dyn InputStream>, CaptureError>;
}

/// A running input stream. Dropping it releases the device.
pub trait InputStream: Send {
    /// Layout of the samples returned by [`InputStream::drain`].
    fn format(&self) -> StreamFormat;

    /// Interleaved samples captured since the previous call, normalised to `[-1, 1]`.
    ///
    /// # Errors
    /// Returns an error if the stream has failed.
    fn drain(&mut self) -> Result<Vec<f32>, CaptureError>;
}

/// Why a capture ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Stopped through the handle.
    Manual,
    /// Quiet for at least the silence timeout.
    Silence,
    /// Hit the recording ceiling.
    MaxDuration,
}

/// Everything captured in one session.
#[derive(Clone, Debug)]
pub struct Recording {
    /// Capture session id, also attached to its tracing span.
    pub id: Uuid,
    /// Layout of `samples`.
    pub format: StreamFormat,
    /// All captured frames, interleaved.
    pub samples: Vec<f32>,
    /// Why the capture ended.
    pub stop_reason: StopReason,
}

impl Recording {
    /// Number of captured frames.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.format.channels.max(1))
    }

    /// Length of the captured audio.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Duration {
        if self.format.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.format.sample_rate))
    }

    /// Whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Split into per-channel buffers ready for encoding.
    ///
    /// # Errors
    /// Returns an error if nothing was captured.
    pub fn into_decoded(self) -> Result<DecodedAudio, AudioError> {
        if self.is_empty() {
            return Err(AudioError::EmptyClip);
        }
        Ok(DecodedAudio::from_interleaved(
            self.format.sample_rate,
            self.format.channels,
            &self.samples,
        ))
    }
}

/// Open `source` and start polling it on the current tokio runtime.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
/// Returns an error if the device cannot be opened; nothing is left running.
pub fn start_capture<S: AudioSource>(
    source: &mut S,
    config: CaptureConfig,
) -> Result<CaptureHandle, CaptureError> {
    config.validate()?;
    let stream = source.open()?;
    let id = Uuid::new_v4();
    let stop = Arc::new(Notify::new());
    let span = tracing::info_span!("capture", %id);

    let task = tokio::spawn(run_capture(stream, config, Arc::clone(&stop), id).instrument(span));

    Ok(CaptureHandle {
        id,
        stop,
        task: Some(task),
    })
}

/// Polling loop of one capture session.
async fn run_capture(
    mut stream: Box<dyn InputStream>,
    config: CaptureConfig,
    stop: Arc<Notify>,
    id: Uuid,
) -> Result<Recording, CaptureError> {
    let format = stream.format();
    info!(
        sample_rate = format.sample_rate,
        channels = format.channels,
        "Capture started"
    );

    let mut detector = config.detector();
    let mut samples: Vec<f32> = Vec::new();

    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let ceiling = tokio::time::sleep(config.max_duration);
    tokio::pin!(ceiling);

    let stop_reason = loop {
        tokio::select! {
            biased;
            () = stop.notified() => break StopReason::Manual,
            () = &mut ceiling => break StopReason::MaxDuration,
            _ = ticker.tick() => {
                samples.extend(stream.drain()?);
                let window = downmix_tail(&samples, format.channels, config.analysis_window);
                let level = rms(&window);
                let decision = detector.observe(level);
                debug!(level, quiet_ticks = detector.quiet_ticks(), ?decision, "VAD tick");
                if decision == VadDecision::SilenceTimeout {
                    break StopReason::Silence;
                }
            }
        }
    };

    samples.extend(stream.drain()?);
    drop(stream);

    let recording = Recording {
        id,
        format,
        samples,
        stop_reason,
    };
    info!(
        ?stop_reason,
        frames = recording.frames(),
        duration_ms = u64::try_from(recording.duration().as_millis()).unwrap_or(u64::MAX),
        "Capture finished"
    );
    Ok(recording)
}

/// Control over a running capture. Dropping it cancels the capture and releases the device.
pub struct CaptureHandle {
    id: Uuid,
    stop: Arc<Notify>,
    task: Option<JoinHandle<Result<Recording, CaptureError>>>,
}

impl CaptureHandle {
    /// Capture session id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Ask the capture to stop at the next opportunity. Idempotent.
    pub fn stop(&self) {
        self.stop.notify_one();
    }

    /// Whether the capture loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the capture to end on its own (or after [`CaptureHandle::stop`]).
    ///
    /// Cancel-safe: dropping the future leaves the capture running.
    ///
    /// # Errors
    /// Returns the stream's error, a task failure, or [`CaptureError::AlreadyFinished`]
    /// if the recording was already collected.
    pub async fn wait(&mut self) -> Result<Recording, CaptureError> {
        let Some(task) = self.task.as_mut() else {
            return Err(CaptureError::AlreadyFinished);
        };
        let joined = task.await;
        self.task = None;
        joined.map_err(|e| CaptureError::Task(e.to_string()))?
    }

    /// Stop the capture and collect the recording.
    ///
    /// # Errors
    /// See [`CaptureHandle::wait`].
    pub async fn finish(mut self) -> Result<Recording, CaptureError> {
        self.stop();
        self.wait().await
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!(id = %self.id, "Capture handle dropped, aborting capture");
            task.abort();
        }
    }
}
