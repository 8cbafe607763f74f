//! Loudness measurement and silence detection.

use std::time::Duration;

/// Root-mean-square of a window of samples; `0.0` for an empty window.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f64 = samples
        .iter()
        .map(|s| {
            let s = f64::from(*s);
            s * s
        })
        .sum();
    (energy / samples.len() as f64).sqrt() as f32
}

/// Mono downmix of the last `window_frames` frames of an interleaved buffer.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn downmix_tail(interleaved: &[f32], channels: u16, window_frames: usize) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    let total_frames = interleaved.len() / channels;
    let start = total_frames.saturating_sub(window_frames);
    interleaved[start * channels..total_frames * channels]
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Outcome of feeding one loudness measurement to a [`SilenceDetector`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VadDecision {
    /// Loudness reached the threshold; the quiet counter was reset.
    Voice,
    /// Quiet, but not yet for long enough.
    Quiet,
    /// Quiet for at least the configured timeout.
    SilenceTimeout,
}

/// Counts consecutive quiet polls and reports when they add up to the timeout.
#[derive(Clone, Debug)]
pub struct SilenceDetector {
    threshold: f32,
    poll_interval: Duration,
    ticks_needed: u32,
    quiet_ticks: u32,
}

impl SilenceDetector {
    /// Create a detector for a given poll interval and silence timeout.
    #[must_use]
    pub fn new(threshold: f32, poll_interval: Duration, silence_timeout: Duration) -> Self {
        let poll = poll_interval.as_nanos().max(1);
        let needed = silence_timeout.as_nanos().div_ceil(poll).max(1);
        Self {
            threshold,
            poll_interval,
            ticks_needed: u32::try_from(needed).unwrap_or(u32::MAX),
            quiet_ticks: 0,
        }
    }

    /// Feed the loudness of the latest poll.
    pub fn observe(&mut self, level: f32) -> VadDecision {
        if level >= self.threshold {
            self.quiet_ticks = 0;
            return VadDecision::Voice;
        }
        self.quiet_ticks = self.quiet_ticks.saturating_add(1);
        if self.quiet_ticks >= self.ticks_needed {
            VadDecision::SilenceTimeout
        } else {
            VadDecision::Quiet
        }
    }

    /// Consecutive quiet polls seen so far.
    #[must_use]
    pub const fn quiet_ticks(&self) -> u32 {
        self.quiet_ticks
    }

    /// Accumulated quiet time.
    #[must_use]
    pub fn quiet_duration(&self) -> Duration {
        self.poll_interval.saturating_mul(self.quiet_ticks)
    }

    /// Forget any accumulated quiet time.
    pub const fn reset(&mut self) {
        self.quiet_ticks = 0;
    }
}
