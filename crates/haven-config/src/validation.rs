// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid hosts, non-empty paths, and retention bounds.

use crate::diagnostic::ConfigError;
use crate::model::HavenConfig;

/// Shortest accepted shared secret.
pub const MIN_SECRET_LEN: usize = 16;

/// Longest accepted retention window.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Shortest accepted in-process purge interval.
pub const MIN_INTERVAL_SECS: u64 = 60;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HavenConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let window = config.retention.window_days;
    if !(1..=MAX_WINDOW_DAYS).contains(&window) {
        errors.push(ConfigError::Validation {
            message: format!(
                "retention.window_days must be between 1 and {MAX_WINDOW_DAYS}, got {window}"
            ),
        });
    }

    if config.retention.interval_secs < MIN_INTERVAL_SECS {
        errors.push(ConfigError::Validation {
            message: format!(
                "retention.interval_secs must be at least {MIN_INTERVAL_SECS}, got {}",
                config.retention.interval_secs
            ),
        });
    }

    check_secret(&mut errors, "gateway.api_token", config.gateway.api_token.as_deref());
    check_secret(
        &mut errors,
        "retention.cron_secret",
        config.retention.cron_secret.as_deref(),
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_secret(errors: &mut Vec<ConfigError>, key: &str, value: Option<&str>) {
    if let Some(secret) = value
        && secret.chars().count() < MIN_SECRET_LEN
    {
        errors.push(ConfigError::Validation {
            message: format!("{key} must be at least {MIN_SECRET_LEN} characters when set"),
        });
    }
}
