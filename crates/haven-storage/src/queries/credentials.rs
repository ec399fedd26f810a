// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stored password hashes for step-up re-authentication.

use chrono::{DateTime, Utc};
use haven_core::{HavenError, UserId};
use rusqlite::{params, OptionalExtension};

use crate::database::{format_timestamp, map_tr_err, Database};

/// Store (or replace) the PHC hash string for `user_id`.
pub async fn upsert_credential(
    db: &Database,
    user_id: &UserId,
    password_hash: String,
    now: DateTime<Utc>,
) -> Result<(), HavenError> {
    let user_id = user_id.to_string();
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO credentials (user_id, password_hash, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                     password_hash = excluded.password_hash,
                     updated_at = excluded.updated_at",
                params![user_id, password_hash, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The stored PHC hash string for `user_id`, if any.
pub async fn get_password_hash(
    db: &Database,
    user_id: &UserId,
) -> Result<Option<String>, HavenError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT password_hash FROM credentials WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
