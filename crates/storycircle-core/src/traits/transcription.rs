// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech-to-text contract.

use async_trait::async_trait;

use crate::error::CircleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AudioBuffer, Transcript};

#[async_trait]
pub trait TranscriptionAdapter: PluginAdapter {
    /// Recognizes speech in the buffer.
    ///
    /// An empty recognition result is reported as an error, never as empty text.
    async fn transcribe(&self, audio: &AudioBuffer) -> Result<Transcript, CircleError>;

    /// MIME types the service accepts, most preferred first.
    fn supported_mime_types(&self) -> Vec<String>;
}
