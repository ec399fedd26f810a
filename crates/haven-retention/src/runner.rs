// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background task that purges on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use haven_config::RetentionConfig;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::scheduler::RetentionScheduler;

/// Shortest period a runner will tick at.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Periodically runs [`RetentionScheduler::run_once`] until cancelled.
///
/// The first pass runs immediately so a restart after downtime catches up.
/// A failed pass is logged and retried on the next tick.
pub struct RetentionRunner {
    scheduler: Arc<RetentionScheduler>,
    period: Duration,
}

impl RetentionRunner {
    /// `period` is clamped to at least [`MIN_PERIOD`].
    pub fn new(scheduler: Arc<RetentionScheduler>, period: Duration) -> Self {
        Self {
            scheduler,
            period: period.max(MIN_PERIOD),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn from_config(scheduler: Arc<RetentionScheduler>, config: &RetentionConfig) -> Self {
        Self::new(scheduler, Duration::from_secs(config.interval_secs))
    }

    /// Run until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs(), "retention runner started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.scheduler.run_once().await {
                        Ok(report) if report.deleted_count > 0 => {
                            info!(deleted = report.deleted_count, "retention pass complete");
                        }
                        Ok(_) => debug!("retention pass found nothing to delete"),
                        Err(e) => warn!(error = %e, "retention purge failed (will retry)"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("retention runner shutting down");
                    break;
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) onto the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
