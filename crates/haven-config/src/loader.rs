// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./haven.toml` > `~/.config/haven/haven.toml` > `/etc/haven/haven.toml`
//! with environment variable overrides via `HAVEN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HavenConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/haven/haven.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "haven.toml";

/// Top-level sections an environment variable may address.
const ENV_SECTIONS: &[&str] = &["service", "storage", "gateway", "retention"];

/// Per-user config file under the XDG config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("haven").join("haven.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/haven/haven.toml` (system-wide)
/// 3. `~/.config/haven/haven.toml` (user XDG config)
/// 4. `./haven.toml` (local directory)
/// 5. `HAVEN_*` environment variables
pub fn load_config() -> Result<HavenConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<HavenConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HavenConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HavenConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HavenConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HavenConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `HAVEN_<SECTION>_<KEY>` to `section.key`.
///
/// Only the first underscore after the section name becomes a dot, so
/// `HAVEN_RETENTION_CRON_SECRET` lands on `retention.cron_secret`.
fn env_provider() -> Env {
    Env::prefixed("HAVEN_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
