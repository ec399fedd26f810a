// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One purge pass over expired applications.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use haven_core::{system_clock, Clock, HavenError, StorageAdapter};

/// Outcome of a purge pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    /// Applications whose deadline had passed when the pass started.
    pub candidates: usize,
    /// Rows actually deleted. Lower than `candidates` when a deadline moved
    /// between selection and deletion.
    pub deleted_count: u64,
}

impl PurgeReport {
    /// Human-readable summary for the trigger endpoint.
    pub fn summary(&self) -> String {
        match self.deleted_count {
            0 => "No expired applications to delete".to_string(),
            1 => "Deleted 1 expired application".to_string(),
            n => format!("Deleted {n} expired applications"),
        }
    }
}

/// Deletes applications whose retention window has closed.
pub struct RetentionScheduler {
    storage: Arc<dyn StorageAdapter>,
    clock: Clock,
}

impl RetentionScheduler {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            storage,
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Purge as of the scheduler's clock.
    pub async fn run_once(&self) -> Result<PurgeReport, HavenError> {
        self.purge_expired((self.clock)().trunc_subsecs(3)).await
    }

    /// Delete every application with `deletion_scheduled_at <= now`.
    ///
    /// Idempotent: a second call with the same `now` deletes nothing.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<PurgeReport, HavenError> {
        let expired = self
            .storage
            .list_expired_applications(now)
            .await
            .inspect_err(|e| error!(error = %e, "failed to list expired applications"))?;

        if expired.is_empty() {
            debug!(%now, "no expired applications");
            return Ok(PurgeReport {
                candidates: 0,
                deleted_count: 0,
            });
        }

        let deleted_count = self
            .storage
            .delete_expired_applications(&expired, now)
            .await
            .inspect_err(|e| {
                error!(error = %e, candidates = expired.len(), "failed to delete expired applications")
            })?;

        info!(
            candidates = expired.len(),
            deleted = deleted_count,
            "expired applications purged"
        );
        Ok(PurgeReport {
            candidates: expired.len(),
            deleted_count,
        })
    }
}
