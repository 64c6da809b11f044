// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ember metadata contract.

use async_trait::async_trait;

use crate::error::CircleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::EmberContext;

/// Read-only source of the aggregate metadata of an ember.
#[async_trait]
pub trait EmberContextSource: PluginAdapter {
    /// The current context. Never cached by callers; it changes between turns.
    async fn context(&self, ember_id: &str) -> Result<EmberContext, CircleError>;
}
