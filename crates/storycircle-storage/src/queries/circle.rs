// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ember-scoped operations that cross participant boundaries.
//!
//! These are the only queries that touch other participants' rows. The read
//! is parameterized by a single ember; the two mutations verify ember
//! ownership inside their own transaction before changing anything.

use rusqlite::{OptionalExtension, Transaction, params};
use storycircle_core::{CircleError, ClearSummary, ConversationType, Message};
use tracing::{debug, info};

use crate::database::{Database, map_tr_err, now_ts};
use crate::models::{MESSAGE_COLUMNS, message_from_row};
use crate::queries::embers::owner_of;

enum OwnerCheck {
    Owner,
    NotOwner,
    UnknownEmber,
}

fn check_owner(
    tx: &Transaction<'_>,
    ember_id: &str,
    requester_id: &str,
) -> Result<OwnerCheck, rusqlite::Error> {
    Ok(match owner_of(tx, ember_id)? {
        None => OwnerCheck::UnknownEmber,
        Some(owner) if owner == requester_id => OwnerCheck::Owner,
        Some(_) => OwnerCheck::NotOwner,
    })
}

fn denied(check: OwnerCheck, action: &str, ember_id: &str, requester_id: &str) -> CircleError {
    match check {
        OwnerCheck::UnknownEmber => CircleError::NotFound {
            entity: "ember",
            id: ember_id.to_string(),
        },
        _ => CircleError::Unauthorized {
            action: action.to_string(),
            user_id: requester_id.to_string(),
        },
    }
}

/// Every participant's messages for one ember and conversation type.
///
/// Ordered by creation time, then sequence number, then id, so near-simultaneous
/// writes from different participants still have a stable order.
pub async fn read_all_messages_for_ember(
    db: &Database,
    ember_id: &str,
    conversation_type: ConversationType,
) -> Result<Vec<Message>, CircleError> {
    let ember_id = ember_id.to_string();
    let kind = conversation_type.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 JOIN conversations c ON c.id = m.conversation_id
                 WHERE c.ember_id = ?1 AND c.conversation_type = ?2
                 ORDER BY m.created_at ASC, m.sequence_number ASC, m.id ASC"
            ))?;
            let rows = stmt.query_map(params![ember_id, kind], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

enum DeleteOutcome {
    Deleted { conversation_id: String, sequence_number: i64 },
    Missing,
    Denied(OwnerCheck),
}

/// Hard-delete one message of an ember. Only the ember owner may do this.
///
/// Later messages in the same conversation are renumbered down by one and the
/// conversation's `message_count` is decremented, keeping sequence numbers
/// contiguous. Returns `false` if the message is not part of the ember.
pub async fn delete_message(
    db: &Database,
    message_id: &str,
    ember_id: &str,
    requester_id: &str,
) -> Result<bool, CircleError> {
    let msg_id = message_id.to_string();
    let ember = ember_id.to_string();
    let requester = requester_id.to_string();

    let outcome = db
        .connection()
        .call(move |conn| -> Result<DeleteOutcome, rusqlite::Error> {
            let tx = conn.transaction()?;
            let check = check_owner(&tx, &ember, &requester)?;
            if !matches!(check, OwnerCheck::Owner) {
                return Ok(DeleteOutcome::Denied(check));
            }

            let target: Option<(String, i64)> = tx
                .query_row(
                    "SELECT m.conversation_id, m.sequence_number FROM messages m
                     JOIN conversations c ON c.id = m.conversation_id
                     WHERE m.id = ?1 AND c.ember_id = ?2",
                    params![msg_id, ember],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((conversation_id, sequence_number)) = target else {
                return Ok(DeleteOutcome::Missing);
            };

            tx.execute("DELETE FROM messages WHERE id = ?1", params![msg_id])?;
            // Two passes through negative numbers so the UNIQUE constraint never
            // sees a transient duplicate.
            tx.execute(
                "UPDATE messages SET sequence_number = -(sequence_number - 1)
                 WHERE conversation_id = ?1 AND sequence_number > ?2",
                params![conversation_id, sequence_number],
            )?;
            tx.execute(
                "UPDATE messages SET sequence_number = -sequence_number
                 WHERE conversation_id = ?1 AND sequence_number < 0",
                params![conversation_id],
            )?;
            tx.execute(
                "UPDATE conversations
                 SET message_count = message_count - 1, updated_at = ?2
                 WHERE id = ?1",
                params![conversation_id, now_ts()],
            )?;
            tx.commit()?;
            Ok(DeleteOutcome::Deleted {
                conversation_id,
                sequence_number,
            })
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        DeleteOutcome::Deleted {
            conversation_id,
            sequence_number,
        } => {
            info!(
                ember_id,
                conversation_id = %conversation_id,
                sequence_number,
                user_id = requester_id,
                "message deleted by ember owner"
            );
            Ok(true)
        }
        DeleteOutcome::Missing => {
            debug!(ember_id, message_id, "delete requested for unknown message");
            Ok(false)
        }
        DeleteOutcome::Denied(check) => {
            Err(denied(check, "delete message", ember_id, requester_id))
        }
    }
}

enum ClearOutcome {
    Cleared(ClearSummary),
    Denied(OwnerCheck),
}

/// Delete every message, then every conversation, of an ember. Owner-only.
pub async fn clear_all_for_ember(
    db: &Database,
    ember_id: &str,
    requester_id: &str,
) -> Result<ClearSummary, CircleError> {
    let ember = ember_id.to_string();
    let requester = requester_id.to_string();

    let outcome = db
        .connection()
        .call(move |conn| -> Result<ClearOutcome, rusqlite::Error> {
            let tx = conn.transaction()?;
            let check = check_owner(&tx, &ember, &requester)?;
            if !matches!(check, OwnerCheck::Owner) {
                return Ok(ClearOutcome::Denied(check));
            }
            let deleted_messages = tx.execute(
                "DELETE FROM messages WHERE conversation_id IN
                     (SELECT id FROM conversations WHERE ember_id = ?1)",
                params![ember],
            )?;
            let deleted_conversations =
                tx.execute("DELETE FROM conversations WHERE ember_id = ?1", params![ember])?;
            tx.commit()?;
            Ok(ClearOutcome::Cleared(ClearSummary {
                deleted_conversations: deleted_conversations as u64,
                deleted_messages: deleted_messages as u64,
            }))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        ClearOutcome::Cleared(summary) => {
            info!(
                ember_id,
                user_id = requester_id,
                deleted_conversations = summary.deleted_conversations,
                deleted_messages = summary.deleted_messages,
                "story circle cleared"
            );
            Ok(summary)
        }
        ClearOutcome::Denied(check) => {
            Err(denied(check, "clear story circle", ember_id, requester_id))
        }
    }
}
