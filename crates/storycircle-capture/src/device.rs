// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped audio capture over a [`CaptureBackend`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use storycircle_core::{AudioBuffer, CaptureError};
use tracing::{debug, warn};

use crate::backend::{CaptureBackend, CaptureStream, DeviceDescriptor};
use crate::encoding::{AudioEncoding, by_preference, negotiate_encoding};
use crate::profile::{CaptureProfile, DeviceClass};

/// Microphone access for one participant session.
///
/// At most one capture is active at a time. The device is held by the
/// returned [`CaptureHandle`] and released when the handle is ended,
/// cancelled, or dropped.
pub struct AudioCaptureDevice {
    backend: Arc<dyn CaptureBackend>,
    class: DeviceClass,
    preferred: Vec<AudioEncoding>,
    service_encodings: Vec<AudioEncoding>,
    in_use: Arc<AtomicBool>,
}

impl AudioCaptureDevice {
    /// `service_encodings` are the encodings the transcription service accepts.
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        class: DeviceClass,
        preferred: Vec<AudioEncoding>,
        service_encodings: Vec<AudioEncoding>,
    ) -> Self {
        Self {
            backend,
            class,
            preferred,
            service_encodings,
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn enumerate_inputs(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        self.backend.enumerate_inputs()
    }

    /// The backend's default input, or the first one listed.
    pub fn default_input(&self) -> Result<DeviceDescriptor, CaptureError> {
        let inputs = self.enumerate_inputs()?;
        let default = inputs.iter().find(|d| d.is_default).cloned();
        default
            .or_else(|| inputs.into_iter().next())
            .ok_or(CaptureError::NoDeviceFound)
    }

    /// Negotiates the profile for a device without touching the hardware.
    pub fn negotiate_profile(&self, device_id: &str) -> Result<CaptureProfile, CaptureError> {
        let device_encodings =
            by_preference(&self.preferred, &self.backend.supported_encodings(device_id));
        let encoding = negotiate_encoding(&device_encodings, &self.service_encodings)?;
        Ok(CaptureProfile::for_class(self.class, encoding))
    }

    /// Acquires the device and starts recording.
    pub fn begin_capture(
        &self,
        device_id: &str,
        profile: CaptureProfile,
    ) -> Result<CaptureHandle, CaptureError> {
        if self
            .in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CaptureError::DeviceBusy);
        }

        match self.backend.open(device_id, &profile) {
            Ok(stream) => {
                debug!(device_id, encoding = %profile.encoding, sample_rate = profile.sample_rate,
                    channels = profile.channels, "capture started");
                Ok(CaptureHandle {
                    stream: Some(stream),
                    profile,
                    in_use: Arc::clone(&self.in_use),
                })
            }
            Err(e) => {
                self.in_use.store(false, Ordering::Release);
                warn!(device_id, error = %e, "capture failed to start");
                Err(e)
            }
        }
    }

    /// Picks the default input, negotiates its profile, and starts recording.
    pub fn begin_default_capture(&self) -> Result<CaptureHandle, CaptureError> {
        let device = self.default_input()?;
        let profile = self.negotiate_profile(&device.id)?;
        self.begin_capture(&device.id, profile)
    }

    /// Stops recording and returns the finished buffer. The device is released
    /// whether or not encoding succeeds.
    pub fn end_capture(&self, mut handle: CaptureHandle) -> Result<AudioBuffer, CaptureError> {
        let encoding = handle.profile.encoding;
        let stream = handle.stream.take().ok_or(CaptureError::EmptyRecording)?;
        let duration_seconds = stream.elapsed_seconds();
        let result = stream.finish();
        drop(handle);

        let bytes = result?;
        if bytes.is_empty() || duration_seconds <= 0.0 {
            return Err(CaptureError::EmptyRecording);
        }
        debug!(size_bytes = bytes.len(), duration_seconds, "capture finished");
        Ok(AudioBuffer {
            bytes,
            mime_type: encoding.mime_type().to_string(),
            duration_seconds,
        })
    }

    /// Abandons a capture. Equivalent to dropping the handle.
    pub fn cancel_capture(&self, handle: CaptureHandle) {
        drop(handle);
        debug!("capture cancelled");
    }

    /// Whether a capture currently holds the device.
    pub fn is_capturing(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }
}

/// An active capture. Dropping it stops the stream and frees the device.
pub struct CaptureHandle {
    stream: Option<Box<dyn CaptureStream>>,
    profile: CaptureProfile,
    in_use: Arc<AtomicBool>,
}

impl CaptureHandle {
    pub fn profile(&self) -> CaptureProfile {
        self.profile
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.stream.as_ref().map_or(0.0, |s| s.elapsed_seconds())
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        // Dropping the stream releases the hardware.
        self.stream.take();
        self.in_use.store(false, Ordering::Release);
    }
}
