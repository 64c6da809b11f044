// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity collaborator contract.

use async_trait::async_trait;

use crate::error::CircleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{UserProfile, VoiceProfile};

/// Read-only access to users, their display data and voice profiles.
#[async_trait]
pub trait IdentityAdapter: PluginAdapter {
    /// The user driving the current session.
    async fn current_user(&self) -> Result<UserProfile, CircleError>;

    /// Display data for any user, if known.
    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, CircleError>;

    /// The user's voice profile, if one has been set up.
    async fn voice_profile(&self, user_id: &str) -> Result<Option<VoiceProfile>, CircleError>;
}
