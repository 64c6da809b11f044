// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite and the domain types in `storycircle-core`.
//!
//! Enum columns are stored as their snake_case names and timestamps as
//! RFC 3339 text; a value that fails to parse surfaces as a
//! `FromSqlConversionFailure` for the offending column.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use storycircle_core::{Conversation, Message};

/// Column list matching [`conversation_from_row`].
pub const CONVERSATION_COLUMNS: &str = "id, ember_id, owner_user_id, conversation_type, title, \
     is_completed, message_count, created_at, updated_at";

/// Column list matching [`message_from_row`], qualified with the `m` alias.
pub const MESSAGE_COLUMNS: &str = "m.id, m.conversation_id, m.sequence_number, m.sender, \
     m.message_type, m.content, m.author_user_id, m.has_audio, m.audio_ref, \
     m.audio_duration_seconds, m.audio_size_bytes, m.transcription_status, \
     m.transcription_confidence, m.created_at";

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        ember_id: row.get(1)?,
        owner_user_id: row.get(2)?,
        conversation_type: parse_column(row, 3)?,
        title: row.get(4)?,
        is_completed: row.get(5)?,
        message_count: row.get(6)?,
        created_at: ts_column(row, 7)?,
        updated_at: ts_column(row, 8)?,
    })
}

pub fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let confidence: Option<f64> = row.get(12)?;
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sequence_number: row.get(2)?,
        sender: parse_column(row, 3)?,
        message_type: parse_column(row, 4)?,
        content: row.get(5)?,
        author_user_id: row.get(6)?,
        has_audio: row.get(7)?,
        audio_ref: row.get(8)?,
        audio_duration_seconds: row.get(9)?,
        audio_size_bytes: row.get(10)?,
        transcription_status: parse_column(row, 11)?,
        transcription_confidence: confidence.map(|c| c as f32),
        created_at: ts_column(row, 13)?,
    })
}
