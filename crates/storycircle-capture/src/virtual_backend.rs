// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A deterministic, scriptable capture backend with no hardware behind it.
//!
//! Produces a sine tone of fixed length for every capture. Failures can be
//! scripted per open, and the number of live streams is observable so callers
//! can assert the device is released on every path.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use storycircle_core::CaptureError;

use crate::backend::{CaptureBackend, CaptureStream, DeviceDescriptor, PcmRecording};
use crate::encoding::AudioEncoding;
use crate::profile::CaptureProfile;
use crate::wav::{encode_wav, f32_to_i16};

#[derive(Debug, Clone)]
enum ScriptedFailure {
    Once(CaptureError),
    Always(CaptureError),
}

pub struct VirtualBackend {
    devices: Vec<DeviceDescriptor>,
    encodings: Vec<AudioEncoding>,
    clip_seconds: f64,
    frequency_hz: f32,
    failure: Mutex<Option<ScriptedFailure>>,
    active: Arc<AtomicUsize>,
    opened: AtomicUsize,
}

impl Default for VirtualBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualBackend {
    /// One default device producing one second of 440 Hz WAV audio.
    pub fn new() -> Self {
        Self {
            devices: vec![DeviceDescriptor {
                id: "virtual-0".to_string(),
                name: "Virtual Microphone".to_string(),
                is_default: true,
            }],
            encodings: vec![AudioEncoding::Wav],
            clip_seconds: 1.0,
            frequency_hz: 440.0,
            failure: Mutex::new(None),
            active: Arc::new(AtomicUsize::new(0)),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn with_devices(mut self, devices: Vec<DeviceDescriptor>) -> Self {
        self.devices = devices;
        self
    }

    pub fn with_encodings(mut self, encodings: Vec<AudioEncoding>) -> Self {
        self.encodings = encodings;
        self
    }

    /// Length of every recording. Zero produces an empty recording.
    pub fn with_clip_seconds(mut self, seconds: f64) -> Self {
        self.clip_seconds = seconds.max(0.0);
        self
    }

    /// The next `open` fails with `error`; later opens succeed.
    pub fn fail_next_open(&self, error: CaptureError) {
        *self.lock_failure() = Some(ScriptedFailure::Once(error));
    }

    /// Every `open` fails with `error` until [`Self::clear_failure`].
    pub fn fail_every_open(&self, error: CaptureError) {
        *self.lock_failure() = Some(ScriptedFailure::Always(error));
    }

    pub fn clear_failure(&self) {
        *self.lock_failure() = None;
    }

    /// Streams currently holding the virtual device.
    pub fn active_streams(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Successful opens since construction.
    pub fn opened_count(&self) -> usize {
        self.opened.load(Ordering::Acquire)
    }

    fn lock_failure(&self) -> std::sync::MutexGuard<'_, Option<ScriptedFailure>> {
        self.failure.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(&self) -> Option<CaptureError> {
        let mut slot = self.lock_failure();
        match slot.take() {
            Some(ScriptedFailure::Once(e)) => Some(e),
            Some(ScriptedFailure::Always(e)) => {
                *slot = Some(ScriptedFailure::Always(e.clone()));
                Some(e)
            }
            None => None,
        }
    }
}

impl CaptureBackend for VirtualBackend {
    fn enumerate_inputs(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        Ok(self.devices.clone())
    }

    fn supported_encodings(&self, device_id: &str) -> Vec<AudioEncoding> {
        if self.devices.iter().any(|d| d.id == device_id) {
            self.encodings.clone()
        } else {
            Vec::new()
        }
    }

    fn open(
        &self,
        device_id: &str,
        profile: &CaptureProfile,
    ) -> Result<Box<dyn CaptureStream>, CaptureError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        if !self.devices.iter().any(|d| d.id == device_id) {
            return Err(CaptureError::NoDeviceFound);
        }
        self.active.fetch_add(1, Ordering::AcqRel);
        self.opened.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(VirtualStream {
            profile: *profile,
            clip_seconds: self.clip_seconds,
            frequency_hz: self.frequency_hz,
            active: Arc::clone(&self.active),
        }))
    }
}

struct VirtualStream {
    profile: CaptureProfile,
    clip_seconds: f64,
    frequency_hz: f32,
    active: Arc<AtomicUsize>,
}

impl VirtualStream {
    fn tone(&self) -> PcmRecording {
        let rate = self.profile.sample_rate;
        let channels = self.profile.channels;
        let frames = (self.clip_seconds * f64::from(rate)).round() as usize;
        let mut samples = Vec::with_capacity(frames * usize::from(channels));
        for frame in 0..frames {
            let t = frame as f32 / rate as f32;
            let value = f32_to_i16(0.25 * (TAU * self.frequency_hz * t).sin());
            for _ in 0..channels {
                samples.push(value);
            }
        }
        PcmRecording {
            samples,
            sample_rate: rate,
            channels,
        }
    }
}

impl CaptureStream for VirtualStream {
    fn finish(self: Box<Self>) -> Result<Vec<u8>, CaptureError> {
        let recording = self.tone();
        match self.profile.encoding {
            AudioEncoding::Wav => encode_wav(&recording),
            // Stand-in payload for compressed encodings: raw little-endian PCM.
            _ => Ok(recording
                .samples
                .iter()
                .flat_map(|s| s.to_le_bytes())
                .collect()),
        }
    }

    fn elapsed_seconds(&self) -> f64 {
        self.clip_seconds
    }
}

impl Drop for VirtualStream {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}
