// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborators used when the CLI runs without a hosted backend.
//!
//! Identity comes from the `--user` flag, ember metadata is empty, and when
//! no completion key is configured every question falls back to the canned
//! Five W's prompts.

use async_trait::async_trait;

use storycircle_core::types::{
    AdapterType, EmberContext, HealthStatus, ProviderRequest, ProviderResponse, UserProfile,
    VoiceProfile,
};
use storycircle_core::{
    CircleError, EmberContextSource, IdentityAdapter, PluginAdapter, ProviderAdapter,
};

fn cli_profile(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        display_name: id.to_string(),
        avatar_ref: None,
    }
}

/// Users are known only by id; the id doubles as the display name.
pub struct LocalIdentity {
    current: Option<String>,
}

impl LocalIdentity {
    pub fn new(current: Option<String>) -> Self {
        Self { current }
    }
}

#[async_trait]
impl PluginAdapter for LocalIdentity {
    fn name(&self) -> &str {
        "local-identity"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, CircleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CircleError> {
        Ok(())
    }
}

#[async_trait]
impl IdentityAdapter for LocalIdentity {
    async fn current_user(&self) -> Result<UserProfile, CircleError> {
        match &self.current {
            Some(id) => Ok(cli_profile(id)),
            None => Err(CircleError::Config("no user given, pass --user".into())),
        }
    }

    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, CircleError> {
        Ok(Some(cli_profile(user_id)))
    }

    async fn voice_profile(&self, _user_id: &str) -> Result<Option<VoiceProfile>, CircleError> {
        Ok(None)
    }
}

/// Ember metadata is not available locally.
pub struct LocalContext;

#[async_trait]
impl PluginAdapter for LocalContext {
    fn name(&self) -> &str {
        "local-context"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::EmberContext
    }

    async fn health_check(&self) -> Result<HealthStatus, CircleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CircleError> {
        Ok(())
    }
}

#[async_trait]
impl EmberContextSource for LocalContext {
    async fn context(&self, ember_id: &str) -> Result<EmberContext, CircleError> {
        Ok(EmberContext {
            ember_id: ember_id.to_string(),
            ..EmberContext::default()
        })
    }
}

/// Stands in for the completion service when no API key is configured.
pub struct OfflineProvider {
    reason: String,
}

impl OfflineProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl PluginAdapter for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, CircleError> {
        Ok(HealthStatus::Degraded(self.reason.clone()))
    }

    async fn shutdown(&self) -> Result<(), CircleError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OfflineProvider {
    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, CircleError> {
        Err(CircleError::Provider {
            message: self.reason.clone(),
            source: None,
        })
    }
}
