// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile queries. Profiles only feed names into the history archive.

use haven_core::{HavenError, Profile, UserId};
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, parsed_at, Database};

pub async fn upsert_profile(db: &Database, profile: &Profile) -> Result<(), HavenError> {
    let profile = profile.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO profiles (id, full_name, role, shelter_name) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     full_name = excluded.full_name,
                     role = excluded.role,
                     shelter_name = excluded.shelter_name",
                params![
                    profile.id.0,
                    profile.full_name,
                    profile.role.to_string(),
                    profile.shelter_name,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_profile(db: &Database, id: &UserId) -> Result<Option<Profile>, HavenError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Profile>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, full_name, role, shelter_name FROM profiles WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Profile {
                        id: UserId(row.get(0)?),
                        full_name: row.get(1)?,
                        role: parsed_at(row, 2)?,
                        shelter_name: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
