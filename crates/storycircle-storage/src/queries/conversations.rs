// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation operations.

use rusqlite::{OptionalExtension, params};
use storycircle_core::{CircleError, Conversation, ConversationType};
use tracing::debug;

use crate::database::{Database, map_tr_err, now_ts};
use crate::models::{CONVERSATION_COLUMNS, conversation_from_row};

fn default_title(conversation_type: ConversationType) -> &'static str {
    match conversation_type {
        ConversationType::Story => "Story Circle",
        ConversationType::General => "Comments",
    }
}

/// Return the open conversation for (ember, user, type), creating it if needed.
///
/// The insert relies on the partial unique index over open conversations:
/// `INSERT OR IGNORE` is a no-op when one already exists, and the follow-up
/// select returns whichever row won. Both run in one transaction on the
/// single writer connection.
pub async fn get_or_create_conversation(
    db: &Database,
    ember_id: &str,
    user_id: &str,
    conversation_type: ConversationType,
) -> Result<Conversation, CircleError> {
    let ember_id = ember_id.to_string();
    let user_id = user_id.to_string();
    let kind = conversation_type.to_string();
    let title = default_title(conversation_type);

    let (conversation, created) = db
        .connection()
        .call(move |conn| -> Result<(Conversation, bool), rusqlite::Error> {
            let tx = conn.transaction()?;
            let now = now_ts();
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO conversations
                     (id, ember_id, owner_user_id, conversation_type, title,
                      is_completed, message_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6, ?6)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    ember_id,
                    user_id,
                    kind,
                    title,
                    now
                ],
            )?;
            let conversation = tx.query_row(
                &format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations
                     WHERE ember_id = ?1 AND owner_user_id = ?2
                       AND conversation_type = ?3 AND is_completed = 0"
                ),
                params![ember_id, user_id, kind],
                conversation_from_row,
            )?;
            tx.commit()?;
            Ok((conversation, inserted == 1))
        })
        .await
        .map_err(map_tr_err)?;

    if created {
        debug!(
            conversation_id = %conversation.id,
            ember_id = %conversation.ember_id,
            user_id = %conversation.owner_user_id,
            "conversation created"
        );
    }
    Ok(conversation)
}

/// Get a conversation by ID.
pub async fn get_conversation(
    db: &Database,
    id: &str,
) -> Result<Option<Conversation>, CircleError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Conversation>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"),
                params![id],
                conversation_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a conversation completed. Completing twice is a no-op.
pub async fn complete_conversation(db: &Database, id: &str) -> Result<(), CircleError> {
    let id_owned = id.to_string();
    let updated = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE conversations SET is_completed = 1, updated_at = ?2 WHERE id = ?1",
                params![id_owned, now_ts()],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if updated == 0 {
        return Err(CircleError::NotFound {
            entity: "conversation",
            id: id.to_string(),
        });
    }
    debug!(conversation_id = %id, "conversation completed");
    Ok(())
}
