// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`HavenError`] to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use haven_core::{ErrorKind, HavenError};

/// Message returned for failures whose details stay in the logs.
const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error description.
    pub error: String,
    /// Machine-readable error class.
    pub kind: String,
}

/// A [`HavenError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub HavenError);

impl From<HavenError> for ApiError {
    fn from(err: HavenError) -> Self {
        Self(err)
    }
}

/// HTTP status for an error class.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidState | ErrorKind::Conflict | ErrorKind::Duplicate => {
            StatusCode::CONFLICT
        }
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::SchedulerAuth => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Config | ErrorKind::Upstream | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        let error = if status.is_server_error() {
            tracing::error!(error = %self.0, kind = %kind, "request failed");
            GENERIC_FAILURE.to_string()
        } else {
            self.0.to_string()
        };
        (
            status,
            Json(ErrorBody {
                error,
                kind: kind.to_string(),
            }),
        )
            .into_response()
    }
}
