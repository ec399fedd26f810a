// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared-secret check for externally triggered purges.

use subtle::ConstantTimeEq;
use tracing::warn;

use haven_core::HavenError;

/// Check a presented bearer token against the configured cron secret.
///
/// Fails closed: with no secret configured, every call is refused.
pub fn authorize_trigger(configured: Option<&str>, presented: Option<&str>) -> Result<(), HavenError> {
    let Some(expected) = configured.filter(|s| !s.is_empty()) else {
        warn!("cleanup trigger refused: no cron secret configured");
        return Err(HavenError::SchedulerUnauthorized);
    };
    let Some(presented) = presented else {
        warn!("cleanup trigger refused: missing bearer token");
        return Err(HavenError::SchedulerUnauthorized);
    };

    let matches = expected.len() == presented.len()
        && bool::from(expected.as_bytes().ct_eq(presented.as_bytes()));
    if matches {
        Ok(())
    } else {
        warn!("cleanup trigger refused: bad bearer token");
        Err(HavenError::SchedulerUnauthorized)
    }
}
