// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Haven service.
//!
//! Exposes the application lifecycle, the per-application messaging channel
//! (including an SSE live feed), the history archive, and the retention
//! cleanup trigger over a JSON REST API. The server runs as a background
//! task owned by [`Gateway`] and stops on cancellation.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod sse;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use haven_config::{GatewayConfig, RetentionConfig};
use haven_core::{AdapterType, HavenError, HealthStatus, PluginAdapter};
use haven_lifecycle::LifecycleManager;
use haven_messaging::MessagingChannel;
use haven_retention::RetentionScheduler;

use crate::auth::AuthConfig;
use crate::server::{GatewayState, HealthState, ServerConfig};

pub use crate::server::build_router;

/// Services the gateway routes requests to.
#[derive(Clone)]
pub struct GatewayServices {
    pub lifecycle: Arc<LifecycleManager>,
    pub messaging: Arc<MessagingChannel>,
    pub retention: Arc<RetentionScheduler>,
}

/// The HTTP gateway adapter.
pub struct Gateway {
    server: ServerConfig,
    state: GatewayState,
    server_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl Gateway {
    pub fn new(
        gateway: &GatewayConfig,
        retention: &RetentionConfig,
        services: GatewayServices,
    ) -> Self {
        let state = GatewayState {
            lifecycle: services.lifecycle,
            messaging: services.messaging,
            retention: services.retention,
            auth: AuthConfig {
                bearer_token: gateway.api_token.clone(),
            },
            cron_secret: retention.cron_secret.clone(),
            health: HealthState {
                start_time: std::time::Instant::now(),
            },
        };
        Self {
            server: ServerConfig {
                host: gateway.host.clone(),
                port: gateway.port,
            },
            state,
            server_handle: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Bind the listener and spawn the server. A bind failure is returned
    /// here and nothing is spawned. The server stops when `shutdown` is
    /// called or `parent` is cancelled.
    pub async fn start(&self, parent: &CancellationToken) -> Result<(), HavenError> {
        let mut handle = self.server_handle.lock().await;
        if handle.is_some() {
            return Err(HavenError::Internal("gateway already started".to_string()));
        }

        let listener = server::bind(&self.server).await?;
        let state = self.state.clone();
        let cancel = self.cancel.clone();
        let parent = parent.clone();
        *handle = Some(tokio::spawn(async move {
            let stop = CancellationToken::new();
            let stop_guard = stop.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = parent.cancelled() => {}
                }
                stop_guard.cancel();
            });
            if let Err(e) = server::start_server(listener, state, stop).await {
                tracing::error!("gateway server error: {e}");
            }
        }));

        tracing::info!(
            host = %self.server.host,
            port = self.server.port,
            "gateway started"
        );
        Ok(())
    }

    /// Wait for the server task to finish.
    pub async fn join(&self) {
        let handle = self.server_handle.lock().await.take();
        if let Some(h) = handle {
            if let Err(e) = h.await {
                tracing::error!(error = %e, "gateway task panicked");
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for Gateway {
    fn name(&self) -> &str {
        "gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, HavenError> {
        let handle = self.server_handle.lock().await;
        match handle.as_ref() {
            Some(h) if !h.is_finished() => Ok(HealthStatus::Healthy),
            Some(_) => Ok(HealthStatus::Unhealthy("server stopped".to_string())),
            None => Ok(HealthStatus::Unhealthy("server not started".to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), HavenError> {
        self.cancel.cancel();
        self.join().await;
        Ok(())
    }
}
