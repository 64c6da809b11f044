// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The seam between capture policy and audio hardware.

use storycircle_core::CaptureError;

use crate::encoding::AudioEncoding;
use crate::profile::CaptureProfile;

/// An input device as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// Interleaved 16-bit PCM as captured.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PcmRecording {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmRecording {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (f64::from(self.sample_rate) * f64::from(self.channels))
    }
}

/// Audio hardware access.
pub trait CaptureBackend: Send + Sync {
    /// Lists input devices. An empty list is valid; callers map it to
    /// [`CaptureError::NoDeviceFound`] when they need one.
    fn enumerate_inputs(&self) -> Result<Vec<DeviceDescriptor>, CaptureError>;

    /// Encodings the device can produce, most preferred first.
    fn supported_encodings(&self, device_id: &str) -> Vec<AudioEncoding>;

    /// Acquires the device and starts recording.
    fn open(
        &self,
        device_id: &str,
        profile: &CaptureProfile,
    ) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

/// A running capture. Dropping it must release the device.
pub trait CaptureStream: Send + Sync {
    /// Stops recording, releases the device, and returns the encoded payload.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, CaptureError>;

    /// Seconds of audio recorded so far.
    fn elapsed_seconds(&self) -> f64;
}
