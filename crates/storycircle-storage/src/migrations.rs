// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema for conversations, messages, embers and training records.
//!
//! The SQL under `migrations/` is embedded at compile time and applied by
//! [`crate::SqliteStorage::initialize`] before any other statement runs.

mod embedded {
    refinery::embed_migrations!("migrations");
}

/// Brings the schema up to date. Already-applied versions are skipped using
/// refinery's history table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), refinery::Error> {
    let report = embedded::migrations::runner().run(conn)?;
    for applied in report.applied_migrations() {
        tracing::debug!(version = applied.version(), name = applied.name(), "applied migration");
    }
    Ok(())
}
