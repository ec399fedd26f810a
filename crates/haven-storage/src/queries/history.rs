// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History archive queries.
//!
//! Rows are keyed by `application_id` and outlive the live application.

use haven_core::{
    ApplicationId, HavenError, HistoryEntry, Party, PetId, UserId,
};
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{
    format_timestamp, map_tr_err, opt_timestamp_at, parsed_at, timestamp_at, Database,
};

const COLUMNS: &str = "id, application_id, pet_id, pet_name, adopter_id, adopter_name, \
                       shelter_id, shelter_name, status, message, applied_at, approved_at, \
                       rejected_at, rejection_reason, created_at";

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.get(0)?,
        application_id: ApplicationId(row.get(1)?),
        pet_id: PetId(row.get(2)?),
        pet_name: row.get(3)?,
        adopter_id: UserId(row.get(4)?),
        adopter_name: row.get(5)?,
        shelter_id: UserId(row.get(6)?),
        shelter_name: row.get(7)?,
        status: parsed_at(row, 8)?,
        message: row.get(9)?,
        applied_at: timestamp_at(row, 10)?,
        approved_at: opt_timestamp_at(row, 11)?,
        rejected_at: opt_timestamp_at(row, 12)?,
        rejection_reason: row.get(13)?,
        created_at: timestamp_at(row, 14)?,
    })
}

/// Insert the entry, or update status, timestamps and reason of the
/// existing entry for the same application. Identity, names, `applied_at`
/// and `created_at` of an existing entry are kept.
pub(crate) fn upsert_in(conn: &rusqlite::Connection, entry: &HistoryEntry) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO application_history ({COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(application_id) DO UPDATE SET
                 status = excluded.status,
                 approved_at = excluded.approved_at,
                 rejected_at = excluded.rejected_at,
                 rejection_reason = excluded.rejection_reason"
        ),
        params![
            entry.id,
            entry.application_id.as_str(),
            entry.pet_id.as_str(),
            entry.pet_name,
            entry.adopter_id.as_str(),
            entry.adopter_name,
            entry.shelter_id.as_str(),
            entry.shelter_name,
            entry.status.to_string(),
            entry.message,
            format_timestamp(entry.applied_at),
            entry.approved_at.map(format_timestamp),
            entry.rejected_at.map(format_timestamp),
            entry.rejection_reason,
            format_timestamp(entry.created_at),
        ],
    )?;
    Ok(())
}

/// History entries for one party, newest first.
pub async fn list_history(db: &Database, party: &Party) -> Result<Vec<HistoryEntry>, HavenError> {
    let column = match party {
        Party::Shelter(_) => "shelter_id",
        Party::Adopter(_) => "adopter_id",
    };
    let user_id = party.user_id().to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<HistoryEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM application_history WHERE {column} = ?1 \
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map(params![user_id], row_to_entry)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_for_application(
    db: &Database,
    application_id: &ApplicationId,
) -> Result<Option<HistoryEntry>, HavenError> {
    let application_id = application_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<HistoryEntry>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM application_history WHERE application_id = ?1"),
                params![application_id],
                row_to_entry,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
