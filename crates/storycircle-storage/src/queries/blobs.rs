// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio blob storage.

use rusqlite::{OptionalExtension, params};
use storycircle_core::CircleError;

use crate::database::{Database, map_tr_err, now_ts};

const REF_PREFIX: &str = "blob:";

/// Store bytes and return an opaque `blob:<uuid>` reference.
pub async fn put_blob(
    db: &Database,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<String, CircleError> {
    let id = uuid::Uuid::new_v4().to_string();
    let blob_ref = format!("{REF_PREFIX}{id}");
    let content_type = content_type.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO audio_blobs (id, content_type, size_bytes, bytes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, content_type, bytes.len() as i64, bytes, now_ts()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(blob_ref)
}

/// Fetch the bytes and content type behind a reference.
pub async fn get_blob(db: &Database, blob_ref: &str) -> Result<(Vec<u8>, String), CircleError> {
    let not_found = || CircleError::NotFound {
        entity: "blob",
        id: blob_ref.to_string(),
    };
    let id = blob_ref
        .strip_prefix(REF_PREFIX)
        .ok_or_else(not_found)?
        .to_string();
    let found = db
        .connection()
        .call(move |conn| -> Result<Option<(Vec<u8>, String)>, rusqlite::Error> {
            conn.query_row(
                "SELECT bytes, content_type FROM audio_blobs WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    found.ok_or_else(not_found)
}
