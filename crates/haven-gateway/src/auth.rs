// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication middleware for the `/v1` API.
//!
//! Callers present the gateway's bearer token (`Authorization: Bearer <token>`)
//! plus an `X-Actor-Id` header naming the user they act for, as asserted by
//! the upstream identity provider. When no token is configured, all requests
//! are rejected (fail-closed).

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use haven_core::UserId;

use crate::error::ErrorBody;

/// Header carrying the acting user's id.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Authentication configuration for the gateway.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. `None` rejects every request.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// The authenticated acting user, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub UserId);

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn token_matches(expected: &str, presented: &str) -> bool {
    expected.len() == presented.len() && bool::from(expected.as_bytes().ct_eq(presented.as_bytes()))
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            error: message.to_string(),
            kind: "unauthenticated".to_string(),
        }),
    )
        .into_response()
}

/// Middleware that validates the bearer token and resolves the [`Actor`].
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(expected) = auth.bearer_token.as_deref() else {
        tracing::error!("gateway has no api token configured -- rejecting request");
        return unauthorized("Unauthorized");
    };

    match bearer_token(request.headers()) {
        Some(token) if token_matches(expected, token) => {}
        _ => {
            tracing::debug!(path = %request.uri().path(), "bearer token rejected");
            return unauthorized("Unauthorized");
        }
    }

    let actor = request
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| Actor(UserId::from(v)));
    let Some(actor) = actor else {
        return unauthorized("missing X-Actor-Id header");
    };

    request.extensions_mut().insert(actor);
    next.run(request).await
}
