// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage, blob and training adapter traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use storycircle_config::model::StorageConfig;
use storycircle_core::{
    AdapterType, BlobStore, CircleError, ClearSummary, Conversation, ConversationType,
    HealthStatus, Message, NewMessage, PluginAdapter, StorageAdapter, TrainingSample,
    TrainingSink,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// One SQLite file holding conversations, audio blobs and training samples.
///
/// Nothing touches disk until [`StorageAdapter::initialize`]; every other
/// call before that fails with a storage error.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    pub fn db(&self) -> Result<&Database, CircleError> {
        self.db
            .get()
            .ok_or_else(|| CircleError::storage("conversation store used before initialize()"))
    }

    async fn checkpoint(db: &Database) -> Result<(), CircleError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CircleError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CircleError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), CircleError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| CircleError::storage("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), CircleError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn register_ember(&self, ember_id: &str, owner_user_id: &str) -> Result<(), CircleError> {
        queries::embers::register_ember(self.db()?, ember_id, owner_user_id).await
    }

    async fn get_or_create_conversation(
        &self,
        ember_id: &str,
        user_id: &str,
        conversation_type: ConversationType,
    ) -> Result<Conversation, CircleError> {
        queries::conversations::get_or_create_conversation(
            self.db()?,
            ember_id,
            user_id,
            conversation_type,
        )
        .await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, CircleError> {
        queries::conversations::get_conversation(self.db()?, id).await
    }

    async fn append_message(
        &self,
        conversation_id: &str,
        message: NewMessage,
    ) -> Result<Message, CircleError> {
        queries::messages::append_message(self.db()?, conversation_id, message).await
    }

    async fn append_first_message(
        &self,
        conversation_id: &str,
        message: NewMessage,
    ) -> Result<Option<Message>, CircleError> {
        queries::messages::append_first_message(self.db()?, conversation_id, message).await
    }

    async fn get_messages(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, CircleError> {
        queries::messages::get_messages(self.db()?, conversation_id, limit).await
    }

    async fn list_own_messages(
        &self,
        ember_id: &str,
        user_id: &str,
        conversation_type: ConversationType,
    ) -> Result<Vec<Message>, CircleError> {
        queries::messages::list_own_messages(self.db()?, ember_id, user_id, conversation_type)
            .await
    }

    async fn read_all_messages_for_ember(
        &self,
        ember_id: &str,
        conversation_type: ConversationType,
    ) -> Result<Vec<Message>, CircleError> {
        queries::circle::read_all_messages_for_ember(self.db()?, ember_id, conversation_type).await
    }

    async fn delete_message(
        &self,
        message_id: &str,
        ember_id: &str,
        requester_id: &str,
    ) -> Result<bool, CircleError> {
        queries::circle::delete_message(self.db()?, message_id, ember_id, requester_id).await
    }

    async fn clear_all_for_ember(
        &self,
        ember_id: &str,
        requester_id: &str,
    ) -> Result<ClearSummary, CircleError> {
        queries::circle::clear_all_for_ember(self.db()?, ember_id, requester_id).await
    }

    async fn complete_conversation(&self, conversation_id: &str) -> Result<(), CircleError> {
        queries::conversations::complete_conversation(self.db()?, conversation_id).await
    }
}

#[async_trait]
impl BlobStore for SqliteStorage {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, CircleError> {
        queries::blobs::put_blob(self.db()?, bytes, content_type).await
    }

    async fn get(&self, blob_ref: &str) -> Result<(Vec<u8>, String), CircleError> {
        queries::blobs::get_blob(self.db()?, blob_ref).await
    }
}

#[async_trait]
impl TrainingSink for SqliteStorage {
    async fn record_sample(&self, sample: TrainingSample) -> Result<(), CircleError> {
        queries::training::insert_sample(self.db()?, sample).await
    }
}
