// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ember ownership registry.

use rusqlite::{OptionalExtension, params};
use storycircle_core::CircleError;

use crate::database::{Database, map_tr_err, now_ts};

/// Record the owner of an ember. An existing owner is never replaced.
pub async fn register_ember(
    db: &Database,
    ember_id: &str,
    owner_user_id: &str,
) -> Result<(), CircleError> {
    let ember_id = ember_id.to_string();
    let owner_user_id = owner_user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR IGNORE INTO embers (id, owner_user_id, created_at) VALUES (?1, ?2, ?3)",
                params![ember_id, owner_user_id, now_ts()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The owner of an ember, if it has been registered.
pub async fn ember_owner(db: &Database, ember_id: &str) -> Result<Option<String>, CircleError> {
    let ember_id = ember_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            owner_of(conn, &ember_id)
        })
        .await
        .map_err(map_tr_err)
}

pub(crate) fn owner_of(
    conn: &rusqlite::Connection,
    ember_id: &str,
) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT owner_user_id FROM embers WHERE id = ?1",
        params![ember_id],
        |row| row.get(0),
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn register_is_idempotent_and_keeps_first_owner() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("e.db").to_str().unwrap())
            .await
            .unwrap();

        register_ember(&db, "ember-1", "alice").await.unwrap();
        register_ember(&db, "ember-1", "mallory").await.unwrap();

        assert_eq!(
            ember_owner(&db, "ember-1").await.unwrap().as_deref(),
            Some("alice")
        );
        assert_eq!(ember_owner(&db, "ember-2").await.unwrap(), None);
        db.close().await.unwrap();
    }
}
