// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention window enforcement for decided applications.
//!
//! Approved and rejected applications carry a `deletion_scheduled_at`
//! deadline. The [`RetentionScheduler`] deletes every application whose
//! deadline has passed; their messages go with them through the storage
//! cascade. The history archive is never touched.
//!
//! Purges are triggered either by the in-process [`RetentionRunner`] or by
//! an external cron hitting the gateway's cleanup endpoint, which checks the
//! shared secret with [`authorize_trigger`].

pub mod runner;
pub mod scheduler;
pub mod trigger;

pub use runner::RetentionRunner;
pub use scheduler::{PurgeReport, RetentionScheduler};
pub use trigger::authorize_trigger;
