// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging channel scoped to a single adoption application.
//!
//! Only the two parties of an application (its adopter and its shelter) may
//! read, post to, or subscribe to the channel.

pub mod channel;

pub use channel::{ChatContact, MessagingChannel};
