// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat message queries.

use haven_core::{ApplicationId, ChatMessage, HavenError, MessageId, UserId};
use rusqlite::params;

use crate::database::{format_timestamp, map_tr_err, timestamp_at, Database};

/// Insert a new message. Fails if the application does not exist.
pub async fn insert_message(db: &Database, msg: &ChatMessage) -> Result<(), HavenError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO messages (id, application_id, sender_id, message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    msg.id.0,
                    msg.application_id.0,
                    msg.sender_id.0,
                    msg.message,
                    format_timestamp(msg.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Messages for an application in chronological order; ties keep insertion order.
pub async fn list_messages(
    db: &Database,
    application_id: &ApplicationId,
) -> Result<Vec<ChatMessage>, HavenError> {
    let application_id = application_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<ChatMessage>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, application_id, sender_id, message, created_at
                 FROM messages WHERE application_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![application_id], |row| {
                Ok(ChatMessage {
                    id: MessageId(row.get(0)?),
                    application_id: ApplicationId(row.get(1)?),
                    sender_id: UserId(row.get(2)?),
                    message: row.get(3)?,
                    created_at: timestamp_at(row, 4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
