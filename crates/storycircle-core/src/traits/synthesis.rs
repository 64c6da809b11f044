// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-to-speech contract.

use async_trait::async_trait;

use crate::error::CircleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::AudioBuffer;

#[async_trait]
pub trait SynthesisAdapter: PluginAdapter {
    /// Renders `text` in the given external voice.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioBuffer, CircleError>;
}
