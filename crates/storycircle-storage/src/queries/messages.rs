// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message operations scoped to one conversation or one participant.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use storycircle_core::{CircleError, ConversationType, Message, NewMessage};
use tracing::debug;

use crate::database::{Database, format_ts, map_tr_err};
use crate::models::{MESSAGE_COLUMNS, message_from_row};

enum AppendOutcome {
    Appended(Message),
    MissingConversation,
    Completed,
    EmptyContent,
    NotEmpty,
}

/// Append a message, assigning the next sequence number inside a transaction.
///
/// The sequence number is `MAX(sequence_number) + 1` for the conversation and
/// the conversation's `message_count` is bumped in the same transaction, so
/// the numbers stay exactly `1..=message_count`.
pub async fn append_message(
    db: &Database,
    conversation_id: &str,
    message: NewMessage,
) -> Result<Message, CircleError> {
    append(db, conversation_id, message, false)
        .await?
        .ok_or_else(|| CircleError::Internal("unconditional append was skipped".to_string()))
}

/// Append `message` only while the conversation holds no messages.
///
/// The emptiness check runs in the append transaction. Returns `None` when
/// another writer got there first.
pub async fn append_first_message(
    db: &Database,
    conversation_id: &str,
    message: NewMessage,
) -> Result<Option<Message>, CircleError> {
    append(db, conversation_id, message, true).await
}

async fn append(
    db: &Database,
    conversation_id: &str,
    message: NewMessage,
    only_if_empty: bool,
) -> Result<Option<Message>, CircleError> {
    let conv_id = conversation_id.to_string();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<AppendOutcome, rusqlite::Error> {
            if message.content.trim().is_empty() {
                return Ok(AppendOutcome::EmptyContent);
            }
            let tx = conn.transaction()?;
            let completed: Option<bool> = tx
                .query_row(
                    "SELECT is_completed FROM conversations WHERE id = ?1",
                    params![conv_id],
                    |row| row.get(0),
                )
                .optional()?;
            match completed {
                None => return Ok(AppendOutcome::MissingConversation),
                Some(true) => return Ok(AppendOutcome::Completed),
                Some(false) => {}
            }

            let sequence_number: i64 = tx.query_row(
                "SELECT COALESCE(MAX(sequence_number), 0) + 1 FROM messages
                 WHERE conversation_id = ?1",
                params![conv_id],
                |row| row.get(0),
            )?;
            if only_if_empty && sequence_number > 1 {
                return Ok(AppendOutcome::NotEmpty);
            }
            let created_at = Utc::now();
            let stored = Message {
                id: uuid::Uuid::new_v4().to_string(),
                conversation_id: conv_id.clone(),
                sequence_number,
                sender: message.sender,
                message_type: message.message_type,
                content: message.content,
                author_user_id: message.author_user_id,
                has_audio: message.has_audio,
                audio_ref: message.audio_ref,
                audio_duration_seconds: message.audio_duration_seconds,
                audio_size_bytes: message.audio_size_bytes,
                transcription_status: message.transcription_status,
                transcription_confidence: message.transcription_confidence,
                created_at,
            };
            tx.execute(
                "INSERT INTO messages
                     (id, conversation_id, sequence_number, sender, message_type, content,
                      author_user_id, has_audio, audio_ref, audio_duration_seconds,
                      audio_size_bytes, transcription_status, transcription_confidence,
                      created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    stored.id,
                    stored.conversation_id,
                    stored.sequence_number,
                    stored.sender.to_string(),
                    stored.message_type.to_string(),
                    stored.content,
                    stored.author_user_id,
                    stored.has_audio,
                    stored.audio_ref,
                    stored.audio_duration_seconds,
                    stored.audio_size_bytes,
                    stored.transcription_status.to_string(),
                    stored.transcription_confidence.map(f64::from),
                    format_ts(created_at),
                ],
            )?;
            tx.execute(
                "UPDATE conversations
                 SET message_count = message_count + 1, updated_at = ?2
                 WHERE id = ?1",
                params![conv_id, format_ts(created_at)],
            )?;
            tx.commit()?;
            Ok(AppendOutcome::Appended(stored))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        AppendOutcome::Appended(message) => {
            debug!(
                conversation_id = %message.conversation_id,
                sequence_number = message.sequence_number,
                sender = %message.sender,
                "message appended"
            );
            Ok(Some(message))
        }
        AppendOutcome::NotEmpty => {
            debug!(conversation_id, "conversation already has messages, append skipped");
            Ok(None)
        }
        AppendOutcome::MissingConversation => Err(CircleError::NotFound {
            entity: "conversation",
            id: conversation_id.to_string(),
        }),
        AppendOutcome::Completed => Err(CircleError::InvalidState(format!(
            "conversation {conversation_id} is completed"
        ))),
        AppendOutcome::EmptyContent => Err(CircleError::InvalidState(
            "message content must not be empty".to_string(),
        )),
    }
}

/// Messages of one conversation in sequence order.
///
/// With a `limit`, only the most recent `limit` messages are returned, still
/// in ascending sequence order.
pub async fn get_messages(
    db: &Database,
    conversation_id: &str,
    limit: Option<i64>,
) -> Result<Vec<Message>, CircleError> {
    let conv_id = conversation_id.to_string();
    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit.unwrap_or(-1);
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT * FROM (
                     SELECT {MESSAGE_COLUMNS} FROM messages m
                     WHERE m.conversation_id = ?1
                     ORDER BY m.sequence_number DESC LIMIT ?2
                 ) ORDER BY sequence_number ASC"
            ))?;
            let rows = stmt.query_map(params![conv_id, limit], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// The participant's own messages for an ember, oldest conversation first,
/// each conversation in sequence order.
///
/// This is the default, non-elevated read path: only conversations owned by
/// `user_id` are visited.
pub async fn list_own_messages(
    db: &Database,
    ember_id: &str,
    user_id: &str,
    conversation_type: ConversationType,
) -> Result<Vec<Message>, CircleError> {
    let ember_id = ember_id.to_string();
    let user_id = user_id.to_string();
    let kind = conversation_type.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 JOIN conversations c ON c.id = m.conversation_id
                 WHERE c.ember_id = ?1 AND c.owner_user_id = ?2 AND c.conversation_type = ?3
                 ORDER BY c.created_at ASC, c.id ASC, m.sequence_number ASC"
            ))?;
            let rows = stmt.query_map(params![ember_id, user_id, kind], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::queries::conversations::{complete_conversation, get_or_create_conversation};
    use storycircle_core::{MessageType, Sender, TranscriptionStatus};
    use tempfile::tempdir;

    async fn setup_db_with_conversation() -> (Arc<Database>, String, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("m.db").to_str().unwrap())
            .await
            .unwrap();
        let conv = get_or_create_conversation(&db, "ember-1", "alice", ConversationType::Story)
            .await
            .unwrap();
        (Arc::new(db), conv.id, dir)
    }

    #[tokio::test]
    async fn append_assigns_consecutive_sequence_numbers() {
        let (db, conv_id, _dir) = setup_db_with_conversation().await;

        let q = append_message(&db, &conv_id, NewMessage::ai_question("Who is in the photo?"))
            .await
            .unwrap();
        let a = append_message(
            &db,
            &conv_id,
            NewMessage::participant_answer("alice", "My grandparents"),
        )
        .await
        .unwrap();

        assert_eq!(q.sequence_number, 1);
        assert_eq!(a.sequence_number, 2);
        assert_eq!(a.sender, Sender::Participant);

        let messages = get_messages(&db, &conv_id, None).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message_type, MessageType::AiQuestion);
        assert_eq!(messages[1].content, "My grandparents");
        assert_eq!(messages[1].transcription_status, TranscriptionStatus::None);

        let conv = crate::queries::conversations::get_conversation(&db, &conv_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conv.message_count, 2);
    }

    #[tokio::test]
    async fn concurrent_appends_never_duplicate_sequence_numbers() {
        let (db, conv_id, _dir) = setup_db_with_conversation().await;

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let db = Arc::clone(&db);
                let conv_id = conv_id.clone();
                tokio::spawn(async move {
                    append_message(
                        &db,
                        &conv_id,
                        NewMessage::participant_answer("alice", format!("answer {i}")),
                    )
                    .await
                })
            })
            .collect();
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let mut seqs: Vec<i64> = get_messages(&db, &conv_id, None)
            .await
            .unwrap()
            .iter()
            .map(|m| m.sequence_number)
            .collect();
        seqs.sort_unstable();
        assert_eq!(seqs, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn get_messages_with_limit_returns_most_recent() {
        let (db, conv_id, _dir) = setup_db_with_conversation().await;
        for i in 0..5 {
            append_message(
                &db,
                &conv_id,
                NewMessage::participant_answer("alice", format!("msg {i}")),
            )
            .await
            .unwrap();
        }

        let messages = get_messages(&db, &conv_id, Some(3)).await.unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg 2", "msg 3", "msg 4"]);
    }

    #[tokio::test]
    async fn failed_transcription_round_trips_with_placeholder() {
        let (db, conv_id, _dir) = setup_db_with_conversation().await;
        let msg = NewMessage::participant_answer("alice", storycircle_core::VOICE_PLACEHOLDER)
            .with_audio("blob:abc".into(), 3.2, 51_200)
            .with_transcription(TranscriptionStatus::Failed, None);
        append_message(&db, &conv_id, msg).await.unwrap();

        let stored = &get_messages(&db, &conv_id, None).await.unwrap()[0];
        assert!(stored.has_audio);
        assert_eq!(stored.transcription_status, TranscriptionStatus::Failed);
        assert!(!stored.content.is_empty());
        assert_eq!(stored.audio_ref.as_deref(), Some("blob:abc"));
        assert_eq!(stored.audio_size_bytes, Some(51_200));
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let (db, conv_id, _dir) = setup_db_with_conversation().await;
        let err = append_message(&db, &conv_id, NewMessage::participant_answer("alice", "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, CircleError::InvalidState(_)));
    }

    #[tokio::test]
    async fn append_to_completed_conversation_is_rejected() {
        let (db, conv_id, _dir) = setup_db_with_conversation().await;
        complete_conversation(&db, &conv_id).await.unwrap();
        let err = append_message(&db, &conv_id, NewMessage::participant_answer("alice", "late"))
            .await
            .unwrap_err();
        assert!(matches!(err, CircleError::InvalidState(_)));
    }

    #[tokio::test]
    async fn first_message_is_only_stored_once() {
        let (db, conv_id, _dir) = setup_db_with_conversation().await;

        let (a, b) = tokio::join!(
            append_first_message(&db, &conv_id, NewMessage::ai_question("Who took this?")),
            append_first_message(&db, &conv_id, NewMessage::ai_question("Where was this?")),
        );
        let stored: Vec<_> = [a.unwrap(), b.unwrap()].into_iter().flatten().collect();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].sequence_number, 1);

        let messages = get_messages(&db, &conv_id, None).await.unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn append_to_missing_conversation_is_not_found() {
        let (db, _conv_id, _dir) = setup_db_with_conversation().await;
        let err = append_message(&db, "nope", NewMessage::ai_question("Hello?"))
            .await
            .unwrap_err();
        assert!(matches!(err, CircleError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_own_messages_excludes_other_participants() {
        let (db, alice_conv, _dir) = setup_db_with_conversation().await;
        let bob_conv = get_or_create_conversation(&db, "ember-1", "bob", ConversationType::Story)
            .await
            .unwrap();
        append_message(&db, &alice_conv, NewMessage::participant_answer("alice", "mine"))
            .await
            .unwrap();
        append_message(&db, &bob_conv.id, NewMessage::participant_answer("bob", "his"))
            .await
            .unwrap();

        let own = list_own_messages(&db, "ember-1", "alice", ConversationType::Story)
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].content, "mine");
    }
}
