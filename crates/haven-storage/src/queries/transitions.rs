// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only transition audit trail.

use haven_core::{ApplicationId, HavenError, TransitionRecord, UserId};
use rusqlite::params;

use crate::database::{format_timestamp, map_tr_err, parsed_at, timestamp_at, Database};

pub(crate) fn insert_in(
    conn: &rusqlite::Connection,
    record: &TransitionRecord,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO application_transitions
             (id, application_id, from_status, to_status, actor_id, reason, occurred_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.application_id.as_str(),
            record.from_status.to_string(),
            record.to_status.to_string(),
            record.actor_id.as_str(),
            record.reason,
            format_timestamp(record.occurred_at),
        ],
    )?;
    Ok(())
}

/// Transitions recorded for one application, oldest first.
pub async fn list_for(
    db: &Database,
    application_id: &ApplicationId,
) -> Result<Vec<TransitionRecord>, HavenError> {
    let application_id = application_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<TransitionRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, application_id, from_status, to_status, actor_id, reason, occurred_at
                 FROM application_transitions WHERE application_id = ?1
                 ORDER BY occurred_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![application_id], |row| {
                Ok(TransitionRecord {
                    id: row.get(0)?,
                    application_id: ApplicationId(row.get(1)?),
                    from_status: parsed_at(row, 2)?,
                    to_status: parsed_at(row, 3)?,
                    actor_id: UserId(row.get(4)?),
                    reason: row.get(5)?,
                    occurred_at: timestamp_at(row, 6)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
