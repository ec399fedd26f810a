// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `haven serve` command implementation.
//!
//! Opens SQLite storage, assembles the lifecycle manager, messaging channel
//! and retention scheduler, then runs the HTTP gateway and the retention
//! runner until SIGINT/SIGTERM.

use std::sync::Arc;

use haven_config::HavenConfig;
use haven_core::{AuthAdapter, HavenError, PluginAdapter, StorageAdapter};
use haven_gateway::{Gateway, GatewayServices};
use haven_lifecycle::LifecycleManager;
use haven_messaging::MessagingChannel;
use haven_retention::{RetentionRunner, RetentionScheduler};
use haven_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Runs the `haven serve` command.
pub async fn run_serve(config: HavenConfig) -> Result<(), HavenError> {
    init_tracing(&config.service.log_level);
    info!(service = %config.service.name, "starting haven serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let as_storage = storage.clone() as Arc<dyn StorageAdapter>;

    let lifecycle = Arc::new(LifecycleManager::new(
        as_storage.clone(),
        storage.clone() as Arc<dyn AuthAdapter>,
        config.retention.window_days,
    ));
    let messaging = Arc::new(MessagingChannel::new(as_storage.clone()));
    let retention = Arc::new(RetentionScheduler::new(as_storage));

    let cancel = install_signal_handler();

    let runner = if config.retention.runner_enabled {
        Some(RetentionRunner::from_config(retention.clone(), &config.retention).spawn(cancel.clone()))
    } else {
        info!("retention runner disabled; relying on the cleanup endpoint");
        None
    };

    let gateway = if config.gateway.enabled {
        if config.gateway.api_token.is_none() {
            warn!("gateway.api_token is not set; all /v1 requests will be rejected");
        }
        if config.retention.cron_secret.is_none() {
            warn!("retention.cron_secret is not set; the cleanup endpoint will reject every call");
        }
        let gateway = Gateway::new(
            &config.gateway,
            &config.retention,
            GatewayServices {
                lifecycle,
                messaging,
                retention,
            },
        );
        if let Err(e) = gateway.start(&cancel).await {
            error!(error = %e, "gateway failed to start");
            cancel.cancel();
            if let Some(runner) = runner {
                let _ = runner.await;
            }
            storage.close().await?;
            return Err(e);
        }
        Some(gateway)
    } else {
        info!("gateway disabled");
        None
    };

    cancel.cancelled().await;
    info!("shutting down");

    if let Some(gateway) = gateway {
        gateway.shutdown().await?;
    }
    if let Some(runner) = runner {
        if let Err(e) = runner.await {
            warn!(error = %e, "retention runner task failed");
        }
    }
    storage.close().await?;

    info!("haven stopped");
    Ok(())
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler; only Ctrl+C will stop haven");
                    let _ = ctrl_c.await;
                    info!("received Ctrl+C, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG`, when set, takes precedence.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("haven={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }

    #[tokio::test]
    async fn serve_exits_with_error_when_gateway_port_is_taken() {
        let dir = tempfile::tempdir().unwrap();
        let held = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = HavenConfig::default();
        config.storage.database_path = dir
            .path()
            .join("serve.db")
            .to_string_lossy()
            .into_owned();
        config.gateway.host = "127.0.0.1".to_string();
        config.gateway.port = held.local_addr().unwrap().port();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            run_serve(config),
        )
        .await
        .expect("serve should return instead of waiting for a signal");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to bind"));
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing("debug");
        init_tracing("info");
    }
}
