// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capture profiles chosen from the device class.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::encoding::AudioEncoding;

/// Coarse power/bandwidth class of the capturing device.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Desktop-class hardware on a stable connection.
    #[default]
    Standard,
    /// Mobile or low-power hardware; uploads are kept small.
    Constrained,
}

/// Concrete parameters for one capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureProfile {
    pub encoding: AudioEncoding,
    pub sample_rate: u32,
    pub channels: u16,
}

impl CaptureProfile {
    /// Mono 16 kHz on constrained devices, stereo 48 kHz otherwise.
    pub fn for_class(class: DeviceClass, encoding: AudioEncoding) -> Self {
        match class {
            DeviceClass::Constrained => Self {
                encoding,
                sample_rate: 16_000,
                channels: 1,
            },
            DeviceClass::Standard => Self {
                encoding,
                sample_rate: 48_000,
                channels: 2,
            },
        }
    }

    /// Uncompressed 16-bit PCM bytes per second at this profile.
    pub fn pcm_bytes_per_second(&self) -> u64 {
        u64::from(self.sample_rate) * u64::from(self.channels) * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constrained_profile_is_smaller() {
        let low = CaptureProfile::for_class(DeviceClass::Constrained, AudioEncoding::Wav);
        let high = CaptureProfile::for_class(DeviceClass::Standard, AudioEncoding::Wav);
        assert_eq!(low.channels, 1);
        assert_eq!(low.sample_rate, 16_000);
        assert_eq!(high.channels, 2);
        assert!(low.pcm_bytes_per_second() * 6 == high.pcm_bytes_per_second());
    }

    #[test]
    fn device_class_parses_config_names() {
        assert_eq!("constrained".parse::<DeviceClass>().unwrap(), DeviceClass::Constrained);
        assert_eq!(DeviceClass::default().to_string(), "standard");
    }
}
