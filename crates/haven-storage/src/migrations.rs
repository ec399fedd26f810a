// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!` and applied when the database is opened.

use haven_core::HavenError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Returns the number of migrations applied by this call.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<usize, HavenError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(HavenError::storage)?;
    Ok(report.applied_migrations().len())
}
