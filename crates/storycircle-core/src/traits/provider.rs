// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion provider contract.

use async_trait::async_trait;

use crate::error::CircleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for language-model completion services.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a request and returns the full response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, CircleError>;
}
