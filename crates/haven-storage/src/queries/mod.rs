// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod applications;
pub mod credentials;
pub mod history;
pub mod messages;
pub mod pets;
pub mod profiles;
pub mod transitions;
