// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Microphone capture through `cpal`.
//!
//! `cpal::Stream` is not `Send`, so each capture owns a dedicated thread that
//! builds the stream, plays it, and drops it when told to stop or when the
//! handle goes away. Samples are collected as 16-bit PCM and encoded as WAV.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, Device, SampleFormat, SampleRate, Stream, StreamConfig};
use storycircle_core::CaptureError;
use tracing::{debug, warn};

use crate::backend::{CaptureBackend, CaptureStream, DeviceDescriptor, PcmRecording};
use crate::encoding::AudioEncoding;
use crate::profile::CaptureProfile;
use crate::wav::{encode_wav, f32_to_i16};

/// The host's default audio backend.
#[derive(Debug, Default)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

fn find_device(device_id: &str) -> Result<Device, CaptureError> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::Backend(e.to_string()))?;
    for device in devices {
        if device.name().map(|n| n == device_id).unwrap_or(false) {
            return Ok(device);
        }
    }
    Err(CaptureError::NoDeviceFound)
}

fn map_build_err(err: BuildStreamError) -> CaptureError {
    match err {
        BuildStreamError::DeviceNotAvailable => CaptureError::NoDeviceFound,
        BuildStreamError::BackendSpecific { err } => {
            let text = err.description.to_ascii_lowercase();
            if text.contains("permission") || text.contains("denied") {
                CaptureError::PermissionDenied
            } else if text.contains("busy") {
                CaptureError::DeviceBusy
            } else {
                CaptureError::Backend(err.description)
            }
        }
        other => CaptureError::Backend(other.to_string()),
    }
}

struct Sink {
    samples: Arc<Mutex<Vec<i16>>>,
    config: StreamConfig,
}

fn build_stream(device: &Device, profile: &CaptureProfile) -> Result<(Stream, Sink), CaptureError> {
    let requested = StreamConfig {
        channels: profile.channels,
        sample_rate: SampleRate(profile.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    let default = device
        .default_input_config()
        .map_err(|e| CaptureError::Backend(e.to_string()))?;
    let format = default.sample_format();

    match build_with(device, requested.clone(), format) {
        Ok(built) => Ok(built),
        Err(BuildStreamError::StreamConfigNotSupported) => {
            debug!(
                sample_rate = profile.sample_rate,
                channels = profile.channels,
                "requested profile unsupported, using device default"
            );
            build_with(device, default.config(), format).map_err(map_build_err)
        }
        Err(e) => Err(map_build_err(e)),
    }
}

fn build_with(
    device: &Device,
    config: StreamConfig,
    format: SampleFormat,
) -> Result<(Stream, Sink), BuildStreamError> {
    let samples = Arc::new(Mutex::new(Vec::new()));
    let on_error = |err: cpal::StreamError| warn!(error = %err, "audio input stream error");

    let stream = match format {
        SampleFormat::I16 => {
            let target = Arc::clone(&samples);
            device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buffer) = target.lock() {
                        buffer.extend_from_slice(data);
                    }
                },
                on_error,
                None,
            )?
        }
        _ => {
            let target = Arc::clone(&samples);
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buffer) = target.lock() {
                        buffer.extend(data.iter().copied().map(f32_to_i16));
                    }
                },
                on_error,
                None,
            )?
        }
    };
    Ok((stream, Sink { samples, config }))
}

impl CaptureBackend for CpalBackend {
    fn enumerate_inputs(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        let devices = host
            .input_devices()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;
        Ok(devices
            .filter_map(|d| d.name().ok())
            .map(|name| DeviceDescriptor {
                is_default: default_name.as_deref() == Some(name.as_str()),
                id: name.clone(),
                name,
            })
            .collect())
    }

    fn supported_encodings(&self, _device_id: &str) -> Vec<AudioEncoding> {
        vec![AudioEncoding::Wav]
    }

    fn open(
        &self,
        device_id: &str,
        profile: &CaptureProfile,
    ) -> Result<Box<dyn CaptureStream>, CaptureError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<Sink, CaptureError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let device_id = device_id.to_string();
        let profile = *profile;

        let thread = std::thread::Builder::new()
            .name("storycircle-capture".to_string())
            .spawn(move || {
                let built = find_device(&device_id).and_then(|d| build_stream(&d, &profile));
                let (stream, sink) = match built {
                    Ok(built) => built,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(CaptureError::Backend(e.to_string())));
                    return;
                }
                if ready_tx.send(Ok(sink)).is_err() {
                    return;
                }
                // Blocks until stop is sent or the sender is dropped.
                let _ = stop_rx.recv();
                drop(stream);
            })
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(sink)) => Ok(Box::new(CpalStream {
                stop: Some(stop_tx),
                thread: Some(thread),
                sink,
            })),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(CaptureError::Backend("capture thread exited".to_string()))
            }
        }
    }
}

struct CpalStream {
    stop: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
    sink: Sink,
}

impl CpalStream {
    fn release(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("capture thread panicked");
            }
        }
    }

    fn recording(&self) -> PcmRecording {
        let samples = self
            .sink
            .samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        PcmRecording {
            samples,
            sample_rate: self.sink.config.sample_rate.0,
            channels: self.sink.config.channels,
        }
    }
}

impl CaptureStream for CpalStream {
    fn finish(mut self: Box<Self>) -> Result<Vec<u8>, CaptureError> {
        self.release();
        let recording = self.recording();
        if recording.samples.is_empty() {
            return Err(CaptureError::EmptyRecording);
        }
        encode_wav(&recording)
    }

    fn elapsed_seconds(&self) -> f64 {
        self.recording().duration_seconds()
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.release();
    }
}
