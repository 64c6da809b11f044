// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and lifecycle shared by every collaborator adapter.

use async_trait::async_trait;

use crate::error::CircleError;
use crate::types::{AdapterType, HealthStatus};

/// Common surface of storage, speech, provider and identity adapters.
///
/// The binary's `health` command walks every registered adapter through
/// [`health_check`](Self::health_check); shutdown runs in reverse
/// registration order.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Short identifier shown in logs and health output, e.g. `"sqlite"`.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    fn adapter_type(&self) -> AdapterType;

    async fn health_check(&self) -> Result<HealthStatus, CircleError>;

    /// Releases connections and flushes buffers. Called once.
    async fn shutdown(&self) -> Result<(), CircleError>;
}
