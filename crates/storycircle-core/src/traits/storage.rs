// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store contract.

use async_trait::async_trait;

use crate::error::CircleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ClearSummary, Conversation, ConversationType, Message, NewMessage};

/// Persistence for conversations and messages.
///
/// Implementations own every mutation of the shared store. Operations that
/// must be atomic (find-or-insert, sequence assignment, owner checks) are
/// atomic inside the implementation, never composed by callers.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), CircleError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), CircleError>;

    /// Records the owner of an ember. Idempotent; an existing owner is never replaced.
    async fn register_ember(&self, ember_id: &str, owner_user_id: &str)
        -> Result<(), CircleError>;

    /// Returns the open conversation for the tuple, creating exactly one if none exists.
    async fn get_or_create_conversation(
        &self,
        ember_id: &str,
        user_id: &str,
        conversation_type: ConversationType,
    ) -> Result<Conversation, CircleError>;

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, CircleError>;

    /// Appends a message, assigning the next sequence number atomically.
    ///
    /// Fails with [`CircleError::InvalidState`] when the conversation is completed.
    async fn append_message(
        &self,
        conversation_id: &str,
        message: NewMessage,
    ) -> Result<Message, CircleError>;

    /// Appends a message only if the conversation is still empty.
    ///
    /// The check and the insert are one atomic step. Returns `None` when the
    /// conversation already had a message.
    async fn append_first_message(
        &self,
        conversation_id: &str,
        message: NewMessage,
    ) -> Result<Option<Message>, CircleError>;

    /// Messages of one conversation in sequence order, optionally only the last `limit`.
    async fn get_messages(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, CircleError>;

    /// The caller's own messages for an ember, across their conversations of one type.
    async fn list_own_messages(
        &self,
        ember_id: &str,
        user_id: &str,
        conversation_type: ConversationType,
    ) -> Result<Vec<Message>, CircleError>;

    /// Elevated read: every participant's messages for one ember, ordered by
    /// creation time, then sequence number, then id.
    async fn read_all_messages_for_ember(
        &self,
        ember_id: &str,
        conversation_type: ConversationType,
    ) -> Result<Vec<Message>, CircleError>;

    /// Hard-deletes one message. The requester must own the ember.
    ///
    /// Returns `false` when the message does not exist within the ember.
    async fn delete_message(
        &self,
        message_id: &str,
        ember_id: &str,
        requester_id: &str,
    ) -> Result<bool, CircleError>;

    /// Deletes every message then every conversation for an ember. Owner-only.
    async fn clear_all_for_ember(
        &self,
        ember_id: &str,
        requester_id: &str,
    ) -> Result<ClearSummary, CircleError>;

    /// Marks a conversation completed so the next get-or-create opens a new one.
    async fn complete_conversation(&self, conversation_id: &str) -> Result<(), CircleError>;
}
