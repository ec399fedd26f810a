// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pet listing queries.

use haven_core::{HavenError, Pet, PetId, PetStatus, UserId};
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, parsed_at, Database};

/// Insert or replace a pet listing.
pub async fn upsert_pet(db: &Database, pet: &Pet) -> Result<(), HavenError> {
    let pet = pet.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO pets (id, shelter_id, name, status) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     shelter_id = excluded.shelter_id,
                     name = excluded.name,
                     status = excluded.status",
                params![pet.id.0, pet.shelter_id.0, pet.name, pet.status.to_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a pet by id.
pub async fn get_pet(db: &Database, id: &PetId) -> Result<Option<Pet>, HavenError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Pet>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, shelter_id, name, status FROM pets WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Pet {
                        id: PetId(row.get(0)?),
                        shelter_id: UserId(row.get(1)?),
                        name: row.get(2)?,
                        status: parsed_at(row, 3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Set a pet's status. Returns `false` if the pet does not exist.
pub async fn set_pet_status(
    db: &Database,
    id: &PetId,
    status: PetStatus,
) -> Result<bool, HavenError> {
    let id = id.clone();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> { set_status_in(conn, &id, status) })
        .await
        .map(|changed| changed > 0)
        .map_err(map_tr_err)
}

/// Status update usable inside an open transaction.
pub(crate) fn set_status_in(
    conn: &rusqlite::Connection,
    id: &PetId,
    status: PetStatus,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE pets SET status = ?2 WHERE id = ?1",
        params![id.as_str(), status.to_string()],
    )
}
