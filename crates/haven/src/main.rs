// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Haven - adoption application lifecycle service.
//!
//! This is the binary entry point for the Haven service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod credentials;
mod purge;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use haven_config::HavenConfig;

/// Haven - adoption application lifecycle service.
#[derive(Parser, Debug)]
#[command(name = "haven", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway and the retention runner.
    Serve,
    /// Delete every application whose retention window has closed, then exit.
    Purge,
    /// Set the step-up password for a shelter account.
    SetPassword {
        /// The shelter's user id.
        user_id: String,
    },
    /// Validate the configuration and print a summary.
    CheckConfig,
}

fn load_config(path: Option<&PathBuf>) -> HavenConfig {
    let loaded = match path {
        Some(path) => haven_config::load_and_validate_path(path),
        None => haven_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            haven_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Purge) => purge::run_purge(config).await,
        Some(Commands::SetPassword { user_id }) => {
            credentials::run_set_password(config, &user_id).await
        }
        Some(Commands::CheckConfig) => {
            print_config_summary(&config);
            Ok(())
        }
        None => {
            println!("haven: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config_summary(config: &HavenConfig) {
    println!("haven: configuration OK");
    println!("  service.name          = {}", config.service.name);
    println!("  storage.database_path = {}", config.storage.database_path);
    println!(
        "  gateway               = {} ({}:{}, api token {})",
        if config.gateway.enabled { "enabled" } else { "disabled" },
        config.gateway.host,
        config.gateway.port,
        if config.gateway.api_token.is_some() { "set" } else { "NOT SET" },
    );
    println!(
        "  retention             = {} days, runner every {}s ({}), cron secret {}",
        config.retention.window_days,
        config.retention.interval_secs,
        if config.retention.runner_enabled { "on" } else { "off" },
        if config.retention.cron_secret.is_some() { "set" } else { "NOT SET" },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["haven", "set-password", "shelter-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::SetPassword { ref user_id }) if user_id == "shelter-1"
        ));

        let cli = Cli::try_parse_from(["haven", "--config", "/tmp/h.toml", "purge"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/h.toml")));
        assert!(matches!(cli.command, Some(Commands::Purge)));
    }

    #[test]
    fn binary_loads_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("haven.toml");
        std::fs::write(&path, "[retention]\nwindow_days = 14\n").unwrap();
        let config = haven_config::load_and_validate_path(&path).expect("valid config");
        assert_eq!(config.retention.window_days, 14);
        assert_eq!(config.service.name, "haven");
    }
}
