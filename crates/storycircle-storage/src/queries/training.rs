// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice training samples collected from successful transcriptions.

use rusqlite::params;
use storycircle_core::{CircleError, TrainingSample};

use crate::database::{Database, map_tr_err, now_ts};

pub async fn insert_sample(db: &Database, sample: TrainingSample) -> Result<(), CircleError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO voice_training_samples
                     (user_id, transcript, audio_ref, duration_seconds, confidence, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    sample.user_id,
                    sample.transcript,
                    sample.audio_ref,
                    sample.duration_seconds,
                    sample.confidence.map(f64::from),
                    now_ts(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Number of samples collected for a user.
pub async fn count_samples(db: &Database, user_id: &str) -> Result<i64, CircleError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM voice_training_samples WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
