// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence gateway for the Haven adoption service.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single
//! serialized connection via `tokio-rusqlite`, transactional lifecycle
//! commits, Argon2id step-up credentials, and an in-process feed of newly
//! inserted chat messages.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod password;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
