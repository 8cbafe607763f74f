//! Default input device via cpal.
//!
//! cpal streams are not `Send`, so each stream lives on its own OS thread and
//! hands samples and runtime errors to the capture loop through a
//! [`SampleChannel`]. Dropping the
//! [`InputStream`] stops that thread, which drops the cpal stream and frees
//! the device.

use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::capture::{AudioSource, InputStream, StreamFormat};
use super::channel::{SampleChannel, sample_channel};
use super::error::CaptureError;

/// The system microphone, or a named input device.
#[derive(Clone, Debug, Default)]
pub struct MicrophoneSource {
    device_name: Option<String>,
}

impl MicrophoneSource {
    /// Use the host's default input device.
    #[must_use]
    pub const fn new() -> Self {
        Self { device_name: None }
    }

    /// Use the input device with this exact name.
    #[must_use]
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    /// Names of the available input devices.
    ///
    /// # Errors
    /// Returns an error if the host cannot enumerate devices.
    pub fn device_names() -> Result<Vec<String>, CaptureError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| CaptureError::AccessDenied(e.to_string()))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }
}

impl AudioSource for MicrophoneSource {
    fn open(&mut self) -> Result<Box<dyn InputStream>, CaptureError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<SampleChannel, CaptureError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let device_name = self.device_name.clone();

        let worker = std::thread::Builder::new()
            .name("chatvox-microphone".to_string())
            .spawn(move || {
                let stream = match build_stream(device_name.as_deref()) {
                    Ok((stream, channel)) => {
                        let _ = ready_tx.send(Ok(channel));
                        stream
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                // Park until asked to stop or the owning stream is gone.
                let _ = stop_rx.recv();
                drop(stream);
                tracing::debug!("Microphone released");
            })
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        let channel = ready_rx
            .recv()
            .map_err(|_| CaptureError::Stream("microphone thread exited".to_string()))??;

        Ok(Box::new(MicrophoneStream {
            channel,
            stop: Some(stop_tx),
            worker: Some(worker),
        }))
    }
}

fn build_stream(device_name: Option<&str>) -> Result<(cpal::Stream, SampleChannel), CaptureError> {
    let host = cpal::default_host();
    let device = match device_name {
        Some(name) => host
            .input_devices()
            .map_err(|e| CaptureError::AccessDenied(e.to_string()))?
            .find(|d| d.name().is_ok_and(|n| n == name)),
        None => host.default_input_device(),
    }
    .ok_or(CaptureError::NoDevice)?;

    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::UnsupportedFormat(e.to_string()))?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let format = StreamFormat {
        sample_rate: config.sample_rate.0,
        channels: config.channels,
    };

    let (sample_tx, channel) = sample_channel(format);
    let fault_tx = sample_tx.clone();
    // Runtime failures such as an unplugged device end the capture on its next poll.
    let on_error = move |err: cpal::StreamError| {
        tracing::warn!(%err, "Microphone stream error");
        fault_tx.fail(err.to_string());
    };

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                sample_tx.send(data.to_vec());
            },
            on_error,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                sample_tx.send(data.iter().map(|s| f32::from(*s) / 32_768.0).collect());
            },
            on_error,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                sample_tx.send(
                    data.iter()
                        .map(|s| (f32::from(*s) - 32_768.0) / 32_768.0)
                        .collect(),
                );
            },
            on_error,
            None,
        ),
        other => {
            return Err(CaptureError::UnsupportedFormat(format!("{other:?}")));
        }
    }
    .map_err(|e| match e {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::NoDevice,
        cpal::BuildStreamError::StreamConfigNotSupported => {
            CaptureError::UnsupportedFormat("stream config not supported".to_string())
        }
        other => CaptureError::AccessDenied(other.to_string()),
    })?;

    stream
        .play()
        .map_err(|e| CaptureError::AccessDenied(e.to_string()))?;
    Ok((stream, channel))
}

struct MicrophoneStream {
    channel: SampleChannel,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl InputStream for MicrophoneStream {
    fn format(&self) -> StreamFormat {
        self.channel.format()
    }

    fn drain(&mut self) -> Result<Vec<f32>, CaptureError> {
        self.channel.drain()
    }
}

impl Drop for MicrophoneStream {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
