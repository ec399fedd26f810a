// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Haven adoption service.

use strum::Display;
use thiserror::Error;

/// The primary error type used across all Haven adapter traits and core operations.
#[derive(Debug, Error)]
pub enum HavenError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence gateway errors (database connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A required field was empty or malformed. The operation was not attempted.
    #[error("validation error: {0}")]
    Validation(String),

    /// The pet is not listed as available, so it cannot receive new applications.
    #[error("pet {pet_id} is not available for adoption")]
    PetUnavailable { pet_id: String },

    /// A chat message was blank after trimming.
    #[error("message must not be empty")]
    EmptyMessage,

    /// The acting user is not a party allowed to perform the operation.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// Step-up credential verification failed or no credential was supplied.
    #[error("re-authentication failed")]
    ReauthenticationFailed,

    /// The requested transition is not allowed from the application's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The adopter already has a live application for the pet.
    #[error("adopter {adopter_id} already has an application for pet {pet_id}")]
    DuplicateApplication { adopter_id: String, pet_id: String },

    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A concurrent writer changed the row between read and commit.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The retention job was invoked without the configured shared secret.
    #[error("retention job invocation not authorized")]
    SchedulerUnauthorized,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of [`HavenError`], used for HTTP mapping and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Upstream,
    Validation,
    Authorization,
    InvalidState,
    Duplicate,
    NotFound,
    Conflict,
    SchedulerAuth,
    Internal,
}

impl HavenError {
    /// Shorthand for a [`HavenError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Wrap any error as a storage failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }

    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Storage { .. } => ErrorKind::Upstream,
            Self::Validation(_) | Self::PetUnavailable { .. } | Self::EmptyMessage => {
                ErrorKind::Validation
            }
            Self::Unauthorized(_) | Self::ReauthenticationFailed => ErrorKind::Authorization,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::DuplicateApplication { .. } => ErrorKind::Duplicate,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::SchedulerUnauthorized => ErrorKind::SchedulerAuth,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the error is a warning-level no-op rather than a failure.
    pub fn is_no_op(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}
