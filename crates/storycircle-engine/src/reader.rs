// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-participant circle reads with author display data.

use std::collections::HashMap;
use std::sync::Arc;

use storycircle_core::{
    AuthoredMessage, CircleError, ConversationType, IdentityAdapter, Sender, StorageAdapter,
    UserProfile,
};
use tracing::warn;

/// Reads a whole circle and attributes each message to its author.
pub struct CircleReader {
    storage: Arc<dyn StorageAdapter>,
    identity: Arc<dyn IdentityAdapter>,
}

impl CircleReader {
    pub fn new(storage: Arc<dyn StorageAdapter>, identity: Arc<dyn IdentityAdapter>) -> Self {
        Self { storage, identity }
    }

    /// Every participant's messages for `ember_id`, in creation order.
    ///
    /// A failed profile lookup leaves that author unresolved rather than
    /// failing the read.
    pub async fn read_circle(
        &self,
        ember_id: &str,
        conversation_type: ConversationType,
    ) -> Result<Vec<AuthoredMessage>, CircleError> {
        let messages = self
            .storage
            .read_all_messages_for_ember(ember_id, conversation_type)
            .await?;

        let mut profiles: HashMap<String, Option<UserProfile>> = HashMap::new();
        let mut authored = Vec::with_capacity(messages.len());
        for message in messages {
            let author = match (&message.sender, &message.author_user_id) {
                (Sender::Participant, Some(user_id)) => {
                    if !profiles.contains_key(user_id) {
                        let profile = match self.identity.profile(user_id).await {
                            Ok(profile) => profile,
                            Err(e) => {
                                warn!(user_id = %user_id, error = %e, "author lookup failed");
                                None
                            }
                        };
                        profiles.insert(user_id.clone(), profile);
                    }
                    profiles.get(user_id).cloned().flatten()
                }
                _ => None,
            };
            authored.push(AuthoredMessage { message, author });
        }
        Ok(authored)
    }
}
