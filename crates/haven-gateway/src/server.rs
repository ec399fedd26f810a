// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use haven_core::HavenError;
use haven_lifecycle::LifecycleManager;
use haven_messaging::MessagingChannel;
use haven_retention::RetentionScheduler;

use crate::auth::{auth_middleware, AuthConfig};
use crate::{handlers, sse};

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub lifecycle: Arc<LifecycleManager>,
    pub messaging: Arc<MessagingChannel>,
    pub retention: Arc<RetentionScheduler>,
    /// Authentication configuration for `/v1`.
    pub auth: AuthConfig,
    /// Shared secret for the cleanup trigger. `None` refuses every call.
    pub cron_secret: Option<String>,
    pub health: HealthState,
}

/// Gateway server bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Assemble the full route table.
///
/// - GET /health (public)
/// - POST /internal/cleanup-applications (cron secret, checked in the handler)
/// - everything under /v1 (bearer token + actor header)
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            "/internal/cleanup-applications",
            post(handlers::post_cleanup_applications),
        )
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/applications",
            post(handlers::post_application).get(handlers::list_applications),
        )
        .route(
            "/v1/applications/{id}",
            get(handlers::get_application).delete(handlers::withdraw_application),
        )
        .route(
            "/v1/applications/{id}/approve",
            post(handlers::approve_application),
        )
        .route(
            "/v1/applications/{id}/reject",
            post(handlers::reject_application),
        )
        .route(
            "/v1/applications/{id}/ignore",
            post(handlers::ignore_application),
        )
        .route(
            "/v1/applications/{id}/messages",
            get(handlers::list_messages).post(handlers::post_message),
        )
        .route(
            "/v1/applications/{id}/messages/stream",
            get(sse::stream_messages),
        )
        .route(
            "/v1/applications/{id}/transitions",
            get(handlers::list_transitions),
        )
        .route("/v1/conversations", get(handlers::list_conversations))
        .route("/v1/history", get(handlers::list_history))
        .route("/v1/pets/{id}/available", post(handlers::mark_pet_available))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Serve the gateway until `cancel` fires.
/// Bind the gateway listener. Fails if the address is unusable or taken.
pub async fn bind(config: &ServerConfig) -> Result<tokio::net::TcpListener, HavenError> {
    let addr = format!("{}:{}", config.host, config.port);
    tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HavenError::Internal(format!("failed to bind gateway to {addr}: {e}")))
}

/// Serve on an already bound listener until `cancel` fires.
pub async fn start_server(
    listener: tokio::net::TcpListener,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), HavenError> {
    let app = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("gateway server listening on {addr}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| HavenError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway server stopped");
    Ok(())
}
