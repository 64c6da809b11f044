// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owner-only destructive actions, issued only after explicit confirmation.
//!
//! `request_*` returns a pending action describing what will be removed.
//! Nothing touches the store until [`PendingDelete::confirm`] or
//! [`PendingClear::confirm`] is called; dropping the pending action cancels it.
//! Ownership is verified by the store inside the write transaction.

use std::sync::Arc;

use storycircle_core::{CircleError, ClearSummary, StorageAdapter};
use tracing::info;

pub struct Moderator {
    storage: Arc<dyn StorageAdapter>,
}

impl Moderator {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    pub fn request_delete(
        &self,
        ember_id: &str,
        message_id: &str,
        requester_id: &str,
    ) -> PendingDelete {
        PendingDelete {
            storage: Arc::clone(&self.storage),
            ember_id: ember_id.to_string(),
            message_id: message_id.to_string(),
            requester_id: requester_id.to_string(),
        }
    }

    pub fn request_clear(&self, ember_id: &str, requester_id: &str) -> PendingClear {
        PendingClear {
            storage: Arc::clone(&self.storage),
            ember_id: ember_id.to_string(),
            requester_id: requester_id.to_string(),
        }
    }
}

/// An unconfirmed message deletion.
#[must_use = "a pending delete does nothing until confirmed"]
pub struct PendingDelete {
    storage: Arc<dyn StorageAdapter>,
    ember_id: String,
    message_id: String,
    requester_id: String,
}

impl PendingDelete {
    /// Text for the confirmation prompt.
    pub fn describe(&self) -> String {
        format!(
            "Permanently delete message {} from this story circle? This cannot be undone.",
            self.message_id
        )
    }

    /// Issues the delete. Returns `false` if the message was not in the ember.
    pub async fn confirm(self) -> Result<bool, CircleError> {
        let deleted = self
            .storage
            .delete_message(&self.message_id, &self.ember_id, &self.requester_id)
            .await?;
        info!(ember_id = %self.ember_id, message_id = %self.message_id, deleted, "message delete confirmed");
        Ok(deleted)
    }
}

/// An unconfirmed clear of a whole circle.
#[must_use = "a pending clear does nothing until confirmed"]
pub struct PendingClear {
    storage: Arc<dyn StorageAdapter>,
    ember_id: String,
    requester_id: String,
}

impl PendingClear {
    pub fn describe(&self) -> String {
        format!(
            "Permanently delete every conversation and message for ember {}? This cannot be undone.",
            self.ember_id
        )
    }

    pub async fn confirm(self) -> Result<ClearSummary, CircleError> {
        let summary = self
            .storage
            .clear_all_for_ember(&self.ember_id, &self.requester_id)
            .await?;
        info!(
            ember_id = %self.ember_id,
            conversations = summary.deleted_conversations,
            messages = summary.deleted_messages,
            "circle cleared"
        );
        Ok(summary)
    }
}
