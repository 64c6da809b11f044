// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice training sink contract.

use async_trait::async_trait;

use crate::error::CircleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::TrainingSample;

/// Receives transcribed speech for later voice-profile construction.
#[async_trait]
pub trait TrainingSink: PluginAdapter {
    async fn record_sample(&self, sample: TrainingSample) -> Result<(), CircleError>;
}
