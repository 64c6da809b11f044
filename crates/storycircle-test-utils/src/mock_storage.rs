// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A store wrapper that injects write failures.
//!
//! Everything is delegated to a real [`SqliteStorage`]; only the calls a test
//! arms are failed, and only once per arming.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use storycircle_core::traits::adapter::PluginAdapter;
use storycircle_core::traits::blob::BlobStore;
use storycircle_core::traits::storage::StorageAdapter;
use storycircle_core::types::{
    AdapterType, ClearSummary, Conversation, ConversationType, HealthStatus, Message, NewMessage,
};
use storycircle_core::{CircleError, FailureKind};
use storycircle_storage::SqliteStorage;

/// [`StorageAdapter`] and [`BlobStore`] over SQLite with armable failures.
pub struct FaultyStore {
    inner: Arc<SqliteStorage>,
    failing_appends: AtomicUsize,
    failing_upload: Mutex<Option<FailureKind>>,
    blobs_stored: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: Arc<SqliteStorage>) -> Self {
        Self {
            inner,
            failing_appends: AtomicUsize::new(0),
            failing_upload: Mutex::new(None),
            blobs_stored: AtomicUsize::new(0),
        }
    }

    /// The next `append_message` fails with a storage error.
    pub fn fail_next_append(&self) {
        self.failing_appends.fetch_add(1, Ordering::SeqCst);
    }

    /// The next blob upload fails with an upload error of `kind`.
    pub async fn fail_next_upload(&self, kind: FailureKind) {
        *self.failing_upload.lock().await = Some(kind);
    }

    /// Blobs successfully written through this wrapper.
    pub fn blob_count(&self) -> usize {
        self.blobs_stored.load(Ordering::SeqCst)
    }

    fn take_append_failure(&self) -> bool {
        self.failing_appends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PluginAdapter for FaultyStore {
    fn name(&self) -> &str {
        "faulty-sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CircleError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), CircleError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl StorageAdapter for FaultyStore {
    async fn initialize(&self) -> Result<(), CircleError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), CircleError> {
        self.inner.close().await
    }

    async fn register_ember(&self, ember_id: &str, owner_user_id: &str) -> Result<(), CircleError> {
        self.inner.register_ember(ember_id, owner_user_id).await
    }

    async fn get_or_create_conversation(
        &self,
        ember_id: &str,
        user_id: &str,
        conversation_type: ConversationType,
    ) -> Result<Conversation, CircleError> {
        self.inner
            .get_or_create_conversation(ember_id, user_id, conversation_type)
            .await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, CircleError> {
        self.inner.get_conversation(id).await
    }

    async fn append_message(
        &self,
        conversation_id: &str,
        message: NewMessage,
    ) -> Result<Message, CircleError> {
        if self.take_append_failure() {
            return Err(CircleError::storage("injected append failure"));
        }
        self.inner.append_message(conversation_id, message).await
    }

    async fn append_first_message(
        &self,
        conversation_id: &str,
        message: NewMessage,
    ) -> Result<Option<Message>, CircleError> {
        self.inner.append_first_message(conversation_id, message).await
    }

    async fn get_messages(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, CircleError> {
        self.inner.get_messages(conversation_id, limit).await
    }

    async fn list_own_messages(
        &self,
        ember_id: &str,
        user_id: &str,
        conversation_type: ConversationType,
    ) -> Result<Vec<Message>, CircleError> {
        self.inner
            .list_own_messages(ember_id, user_id, conversation_type)
            .await
    }

    async fn read_all_messages_for_ember(
        &self,
        ember_id: &str,
        conversation_type: ConversationType,
    ) -> Result<Vec<Message>, CircleError> {
        self.inner
            .read_all_messages_for_ember(ember_id, conversation_type)
            .await
    }

    async fn delete_message(
        &self,
        message_id: &str,
        ember_id: &str,
        requester_id: &str,
    ) -> Result<bool, CircleError> {
        self.inner.delete_message(message_id, ember_id, requester_id).await
    }

    async fn clear_all_for_ember(
        &self,
        ember_id: &str,
        requester_id: &str,
    ) -> Result<ClearSummary, CircleError> {
        self.inner.clear_all_for_ember(ember_id, requester_id).await
    }

    async fn complete_conversation(&self, conversation_id: &str) -> Result<(), CircleError> {
        self.inner.complete_conversation(conversation_id).await
    }
}

#[async_trait]
impl BlobStore for FaultyStore {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, CircleError> {
        if let Some(kind) = self.failing_upload.lock().await.take() {
            return Err(CircleError::Upload {
                message: "injected upload failure".into(),
                kind,
            });
        }
        let blob_ref = BlobStore::put(self.inner.as_ref(), bytes, content_type).await?;
        self.blobs_stored.fetch_add(1, Ordering::SeqCst);
        Ok(blob_ref)
    }

    async fn get(&self, blob_ref: &str) -> Result<(Vec<u8>, String), CircleError> {
        BlobStore::get(self.inner.as_ref(), blob_ref).await
    }
}
