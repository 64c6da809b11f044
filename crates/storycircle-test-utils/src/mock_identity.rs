// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory identity and ember context collaborators.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use storycircle_core::traits::adapter::PluginAdapter;
use storycircle_core::traits::context::EmberContextSource;
use storycircle_core::traits::identity::IdentityAdapter;
use storycircle_core::types::{AdapterType, EmberContext, HealthStatus, UserProfile, VoiceProfile};
use storycircle_core::CircleError;

/// Users and voice profiles held in memory. The first user added becomes the
/// current user unless [`MockIdentity::sign_in`] says otherwise.
#[derive(Default)]
pub struct MockIdentity {
    users: RwLock<HashMap<String, UserProfile>>,
    voices: RwLock<HashMap<String, VoiceProfile>>,
    current: RwLock<Option<String>>,
}

impl MockIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, id: &str, display_name: &str) -> UserProfile {
        let profile = UserProfile {
            id: id.to_string(),
            display_name: display_name.to_string(),
            avatar_ref: None,
        };
        self.users.write().await.insert(id.to_string(), profile.clone());
        let mut current = self.current.write().await;
        if current.is_none() {
            *current = Some(id.to_string());
        }
        profile
    }

    pub async fn sign_in(&self, id: &str) {
        *self.current.write().await = Some(id.to_string());
    }

    pub async fn set_voice(&self, user_id: &str, voice_id: &str) {
        self.voices.write().await.insert(
            user_id.to_string(),
            VoiceProfile {
                user_id: user_id.to_string(),
                external_voice_id: Some(voice_id.to_string()),
            },
        );
    }
}

#[async_trait]
impl PluginAdapter for MockIdentity {
    fn name(&self) -> &str {
        "mock-identity"
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
impl IdentityAdapter for MockIdentity {
    async fn current_user(&self) -> Result<UserProfile, CircleError> {
        let current = self.current.read().await.clone();
        let Some(id) = current else {
            return Err(CircleError::NotFound {
                entity: "user",
                id: "current".to_string(),
            });
        };
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(CircleError::NotFound { entity: "user", id })
    }

    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, CircleError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn voice_profile(&self, user_id: &str) -> Result<Option<VoiceProfile>, CircleError> {
        Ok(self.voices.read().await.get(user_id).cloned())
    }
}

/// Ember metadata keyed by ember id. Unknown embers get an empty context.
#[derive(Default)]
pub struct MockEmberContext {
    contexts: RwLock<HashMap<String, EmberContext>>,
}

impl MockEmberContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the context for `context.ember_id`.
    pub async fn set(&self, context: EmberContext) {
        self.contexts
            .write()
            .await
            .insert(context.ember_id.clone(), context);
    }
}

#[async_trait]
impl PluginAdapter for MockEmberContext {
    fn name(&self) -> &str {
        "mock-ember-context"
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
impl EmberContextSource for MockEmberContext {
    async fn context(&self, ember_id: &str) -> Result<EmberContext, CircleError> {
        let known = self.contexts.read().await.get(ember_id).cloned();
        Ok(known.unwrap_or_else(|| EmberContext {
            ember_id: ember_id.to_string(),
            ..EmberContext::default()
        }))
    }
}
