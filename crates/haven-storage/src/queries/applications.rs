// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application CRUD, transactional transition commits, and purge queries.

use chrono::{DateTime, Utc};
use haven_core::traits::TransitionCommit;
use haven_core::{
    Application, ApplicationFilter, ApplicationId, ApplicationRecord, ApplicationStatus,
    HavenError, Party, PetId, UserId,
};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{
    self, flatten_tr_err, format_timestamp, map_tr_err, opt_timestamp_at, parsed_at,
    timestamp_at, Database,
};
use crate::queries::{history, pets, transitions};

const COLUMNS: &str = "id, adopter_id, shelter_id, pet_id, status, message, created_at, \
                       approved_at, rejected_at, rejection_reason, deletion_scheduled_at, updated_at";

fn row_to_application(row: &Row<'_>) -> rusqlite::Result<Application> {
    let record = ApplicationRecord {
        id: ApplicationId(row.get(0)?),
        adopter_id: UserId(row.get(1)?),
        shelter_id: UserId(row.get(2)?),
        pet_id: PetId(row.get(3)?),
        status: parsed_at(row, 4)?,
        message: row.get(5)?,
        created_at: timestamp_at(row, 6)?,
        approved_at: opt_timestamp_at(row, 7)?,
        rejected_at: opt_timestamp_at(row, 8)?,
        rejection_reason: row.get(9)?,
        deletion_scheduled_at: opt_timestamp_at(row, 10)?,
        updated_at: timestamp_at(row, 11)?,
    };
    Application::try_from(record)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))
}

/// Insert a new application.
///
/// The unique (adopter_id, pet_id) index turns a second application for the
/// same pet into [`HavenError::DuplicateApplication`].
pub async fn insert_application(db: &Database, app: &Application) -> Result<(), HavenError> {
    let r = app.to_record();
    let adopter_id = r.adopter_id.to_string();
    let pet_id = r.pet_id.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                &format!(
                    "INSERT INTO applications ({COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    r.id.0,
                    r.adopter_id.0,
                    r.shelter_id.0,
                    r.pet_id.0,
                    r.status.to_string(),
                    r.message,
                    format_timestamp(r.created_at),
                    r.approved_at.map(format_timestamp),
                    r.rejected_at.map(format_timestamp),
                    r.rejection_reason,
                    r.deletion_scheduled_at.map(format_timestamp),
                    format_timestamp(r.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(ref inner) if database::is_unique_violation(inner) => {
                HavenError::DuplicateApplication { adopter_id, pet_id }
            }
            other => map_tr_err(other),
        })
}

/// Get an application by id.
pub async fn get_application(
    db: &Database,
    id: &ApplicationId,
) -> Result<Option<Application>, HavenError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Application>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM applications WHERE id = ?1"),
                params![id],
                row_to_application,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Applications for one party, newest first, optionally narrowed by status.
pub async fn list_applications(
    db: &Database,
    filter: &ApplicationFilter,
) -> Result<Vec<Application>, HavenError> {
    let column = match filter.party {
        Party::Shelter(_) => "shelter_id",
        Party::Adopter(_) => "adopter_id",
    };
    let user_id = filter.party.user_id().to_string();
    let status = filter.status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| -> Result<Vec<Application>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM applications \
                 WHERE {column} = ?1 AND (?2 IS NULL OR status = ?2) \
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map(params![user_id, status], row_to_application)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// The application, if any, from `adopter_id` for `pet_id`.
pub async fn find_application_for(
    db: &Database,
    adopter_id: &UserId,
    pet_id: &PetId,
) -> Result<Option<Application>, HavenError> {
    let adopter_id = adopter_id.to_string();
    let pet_id = pet_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Application>, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM applications WHERE adopter_id = ?1 AND pet_id = ?2"
                ),
                params![adopter_id, pet_id],
                row_to_application,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply one lifecycle transition in a single transaction.
///
/// The application row is updated only while its status still equals
/// `commit.expected_status`. Any failure rolls back every write.
pub async fn commit_transition(
    db: &Database,
    commit: &TransitionCommit,
) -> Result<(), HavenError> {
    let commit = commit.clone();
    db.connection()
        .call(move |conn| -> Result<(), HavenError> {
            let tx = conn.transaction().map_err(HavenError::storage)?;
            let r = commit.application.to_record();
            let updated = tx
                .execute(
                    "UPDATE applications SET status = ?2, approved_at = ?3, rejected_at = ?4, \
                     rejection_reason = ?5, deletion_scheduled_at = ?6, updated_at = ?7 \
                     WHERE id = ?1 AND status = ?8",
                    params![
                        r.id.0,
                        r.status.to_string(),
                        r.approved_at.map(format_timestamp),
                        r.rejected_at.map(format_timestamp),
                        r.rejection_reason,
                        r.deletion_scheduled_at.map(format_timestamp),
                        format_timestamp(r.updated_at),
                        commit.expected_status.to_string(),
                    ],
                )
                .map_err(HavenError::storage)?;

            if updated == 0 {
                let exists: bool = tx
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM applications WHERE id = ?1)",
                        params![r.id.0],
                        |row| row.get(0),
                    )
                    .map_err(HavenError::storage)?;
                return Err(if exists {
                    HavenError::Conflict(format!(
                        "application {} is no longer {}",
                        r.id, commit.expected_status
                    ))
                } else {
                    HavenError::not_found("application", &r.id)
                });
            }

            if let Some(status) = commit.pet_status {
                let changed =
                    pets::set_status_in(&tx, &r.pet_id, status).map_err(HavenError::storage)?;
                if changed == 0 {
                    return Err(HavenError::not_found("pet", &r.pet_id));
                }
            }
            if let Some(entry) = &commit.history {
                history::upsert_in(&tx, entry).map_err(HavenError::storage)?;
            }
            transitions::insert_in(&tx, &commit.record).map_err(HavenError::storage)?;

            tx.commit().map_err(HavenError::storage)
        })
        .await
        .map_err(flatten_tr_err)
}

/// Delete an application only while it is still pending.
pub async fn delete_pending_application(
    db: &Database,
    id: &ApplicationId,
) -> Result<bool, HavenError> {
    let id = id.to_string();
    let pending = ApplicationStatus::Pending.to_string();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM applications WHERE id = ?1 AND status = ?2",
                params![id, pending],
            )
        })
        .await
        .map(|deleted| deleted > 0)
        .map_err(map_tr_err)
}

/// Ids of applications whose scheduled deletion is at or before `now`.
pub async fn list_expired(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<Vec<ApplicationId>, HavenError> {
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| -> Result<Vec<ApplicationId>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id FROM applications \
                 WHERE deletion_scheduled_at IS NOT NULL AND deletion_scheduled_at <= ?1 \
                 ORDER BY deletion_scheduled_at ASC",
            )?;
            let rows = stmt.query_map(params![now], |row| Ok(ApplicationId(row.get(0)?)))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete the given applications in one transaction.
///
/// Each delete re-checks the deletion time against `now`, so a row whose
/// schedule moved forward after listing is kept. Returns rows deleted.
pub async fn delete_expired(
    db: &Database,
    ids: &[ApplicationId],
    now: DateTime<Utc>,
) -> Result<u64, HavenError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut deleted = 0u64;
            {
                let mut stmt = tx.prepare(
                    "DELETE FROM applications WHERE id = ?1 \
                     AND deletion_scheduled_at IS NOT NULL AND deletion_scheduled_at <= ?2",
                )?;
                for id in &ids {
                    deleted += stmt.execute(params![id, now])? as u64;
                }
            }
            tx.commit()?;
            Ok(deleted)
        })
        .await
        .map_err(map_tr_err)
}
