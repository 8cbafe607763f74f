//! Hand-off of samples from a device callback thread to the capture loop.
//!
//! Device callbacks run on threads the capture loop does not own. They push
//! sample blocks into a [`SampleSender`] and report runtime failures through
//! it. The loop drains the matching [`SampleChannel`], which turns a reported
//! failure into [`CaptureError::Stream`] on the next poll.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};

use super::capture::{InputStream, StreamFormat};
use super::error::CaptureError;

/// First runtime failure reported by a device, shared by both ends.
#[derive(Clone, Debug, Default)]
struct Fault(Arc<Mutex<Option<String>>>);

impl Fault {
    fn raise(&self, message: String) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(message);
        }
    }

    fn get(&self) -> Option<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Callback side of a sample channel.
#[derive(Clone, Debug)]
pub struct SampleSender {
    samples: Sender<Vec<f32>>,
    fault: Fault,
}

impl SampleSender {
    /// Queue a block of interleaved samples. Dropped silently once the reader is gone.
    pub fn send(&self, block: Vec<f32>) {
        let _ = self.samples.send(block);
    }

    /// Report a runtime device failure. Only the first report is kept.
    pub fn fail(&self, message: impl Into<String>) {
        self.fault.raise(message.into());
    }
}

/// Capture-loop side of a sample channel.
#[derive(Debug)]
pub struct SampleChannel {
    format: StreamFormat,
    samples: Receiver<Vec<f32>>,
    fault: Fault,
}

/// Create a connected sender and channel for a stream with this layout.
#[must_use]
pub fn sample_channel(format: StreamFormat) -> (SampleSender, SampleChannel) {
    let (tx, rx) = mpsc::channel();
    let fault = Fault::default();
    (
        SampleSender {
            samples: tx,
            fault: fault.clone(),
        },
        SampleChannel {
            format,
            samples: rx,
            fault,
        },
    )
}

impl InputStream for SampleChannel {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn drain(&mut self) -> Result<Vec<f32>, CaptureError> {
        if let Some(message) = self.fault.get() {
            return Err(CaptureError::Stream(message));
        }
        let mut out = Vec::new();
        loop {
            match self.samples.try_recv() {
                Ok(block) => out.extend(block),
                Err(TryRecvError::Empty) => return Ok(out),
                Err(TryRecvError::Disconnected) => {
                    return Err(CaptureError::Stream("input device disconnected".to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONO_16K: StreamFormat = StreamFormat {
        sample_rate: 16_000,
        channels: 1,
    };

    #[test]
    fn test_drain_collects_queued_blocks() {
        let (tx, mut rx) = sample_channel(MONO_16K);
        tx.send(vec![0.1, 0.2]);
        tx.send(vec![0.3]);

        let samples = rx.drain().unwrap_or_else(|e| panic!("drain failed: {e}"));
        assert_eq!(samples, vec![0.1, 0.2, 0.3]);
        let empty = rx.drain().unwrap_or_else(|e| panic!("drain failed: {e}"));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_reported_failure_ends_the_stream() {
        let (tx, mut rx) = sample_channel(MONO_16K);
        tx.send(vec![0.5; 8]);
        tx.fail("device not available");
        tx.fail("second failure is ignored");

        match rx.drain() {
            Err(CaptureError::Stream(message)) => assert_eq!(message, "device not available"),
            other => panic!("expected stream error, got {other:?}"),
        }
        assert!(matches!(rx.drain(), Err(CaptureError::Stream(_))));
    }

    #[test]
    fn test_dropped_sender_is_a_disconnect() {
        let (tx, mut rx) = sample_channel(MONO_16K);
        drop(tx);
        assert!(matches!(rx.drain(), Err(CaptureError::Stream(_))));
    }
}
