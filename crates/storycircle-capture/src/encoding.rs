// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio encodings and the pure negotiation between device and service.

use serde::{Deserialize, Serialize};
use storycircle_core::CaptureError;
use strum::{Display, EnumString};

/// Container/codec combinations a recording can be produced in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    WebmOpus,
    OggOpus,
    Mp4Aac,
    Mpeg,
    Wav,
}

impl AudioEncoding {
    pub const ALL: [AudioEncoding; 5] = [
        AudioEncoding::WebmOpus,
        AudioEncoding::OggOpus,
        AudioEncoding::Mp4Aac,
        AudioEncoding::Mpeg,
        AudioEncoding::Wav,
    ];

    pub fn mime_type(self) -> &'static str {
        match self {
            AudioEncoding::WebmOpus => "audio/webm;codecs=opus",
            AudioEncoding::OggOpus => "audio/ogg;codecs=opus",
            AudioEncoding::Mp4Aac => "audio/mp4",
            AudioEncoding::Mpeg => "audio/mpeg",
            AudioEncoding::Wav => "audio/wav",
        }
    }

    /// File extension used when the payload is uploaded as a named part.
    pub fn extension(self) -> &'static str {
        match self {
            AudioEncoding::WebmOpus => "webm",
            AudioEncoding::OggOpus => "ogg",
            AudioEncoding::Mp4Aac => "m4a",
            AudioEncoding::Mpeg => "mp3",
            AudioEncoding::Wav => "wav",
        }
    }

    /// Parses a MIME type, ignoring parameters other than the codec hint.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        let base = mime.split(';').next().unwrap_or_default().trim();
        match base {
            "audio/webm" => Some(AudioEncoding::WebmOpus),
            "audio/ogg" => Some(AudioEncoding::OggOpus),
            "audio/mp4" | "audio/m4a" | "audio/aac" => Some(AudioEncoding::Mp4Aac),
            "audio/mpeg" | "audio/mp3" => Some(AudioEncoding::Mpeg),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(AudioEncoding::Wav),
            _ => None,
        }
    }
}

/// Picks the first encoding in `supported_by_device` (preference order) that
/// the transcription service also accepts.
pub fn negotiate_encoding(
    supported_by_device: &[AudioEncoding],
    supported_by_service: &[AudioEncoding],
) -> Result<AudioEncoding, CaptureError> {
    supported_by_device
        .iter()
        .copied()
        .find(|e| supported_by_service.contains(e))
        .ok_or_else(|| CaptureError::UnsupportedEncoding {
            requested: supported_by_device
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Orders the device's encodings by a configured preference list. Encodings
/// the device supports but the list omits are dropped.
pub fn by_preference(
    preferred: &[AudioEncoding],
    supported_by_device: &[AudioEncoding],
) -> Vec<AudioEncoding> {
    preferred
        .iter()
        .copied()
        .filter(|e| supported_by_device.contains(e))
        .collect()
}
