// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WAV encoding of captured PCM.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use storycircle_core::CaptureError;

use crate::backend::PcmRecording;

/// Encodes interleaved 16-bit PCM as a WAV file in memory.
pub fn encode_wav(recording: &PcmRecording) -> Result<Vec<u8>, CaptureError> {
    let spec = WavSpec {
        channels: recording.channels,
        sample_rate: recording.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut out = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut out, spec)
            .map_err(|e| CaptureError::Backend(format!("failed to create WAV writer: {e}")))?;
        for &sample in &recording.samples {
            writer
                .write_sample(sample)
                .map_err(|e| CaptureError::Backend(format!("failed to write sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| CaptureError::Backend(format!("failed to finalize WAV: {e}")))?;
    }
    Ok(out.into_inner())
}

/// Converts float samples in -1.0..=1.0 to 16-bit PCM, clamping overshoot.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
