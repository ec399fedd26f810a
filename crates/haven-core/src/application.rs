// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adoption application model and its state machine.
//!
//! [`ApplicationState`] is a tagged sum type. The persisted column layout
//! (`status`, `approved_at`, `rejected_at`, `rejection_reason`,
//! `deletion_scheduled_at`) is derived from it through [`ApplicationRecord`],
//! so the nullable-column invariants hold by construction:
//!
//! - `approved_at` and `rejected_at` are never both set.
//! - `rejection_reason` is set only alongside `rejected_at`.
//! - `deletion_scheduled_at` is set iff the status is approved or rejected.
//!
//! Transitions are pure functions returning the next variant; side effects
//! (pet status, history archive, audit trail) belong to the lifecycle manager.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::HavenError;
use crate::types::{ApplicationId, ApplicationStatus, Pet, PetId, UserId};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Lifecycle state of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApplicationState {
    /// Submitted and awaiting the shelter's decision.
    Pending,
    /// Approved by the shelter; purged after the retention window.
    Approved {
        approved_at: DateTime<Utc>,
        deletion_scheduled_at: DateTime<Utc>,
    },
    /// Rejected by the shelter with a reason; purged after the retention window.
    Rejected {
        rejected_at: DateTime<Utc>,
        rejection_reason: String,
        deletion_scheduled_at: DateTime<Utc>,
    },
    /// Soft-hidden by the shelter. No further transitions are modeled.
    Ignored,
}

/// Why a transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The application is already in the target state.
    #[error("application is already {0}")]
    AlreadyInState(ApplicationStatus),

    /// The transition is not defined from the current state.
    #[error("cannot {action} an application that is {from}")]
    NotAllowed {
        from: ApplicationStatus,
        action: &'static str,
    },

    /// A rejection was attempted without a reason.
    #[error("rejection reason must not be empty")]
    BlankReason,
}

impl From<TransitionError> for HavenError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::BlankReason => HavenError::Validation(err.to_string()),
            TransitionError::AlreadyInState(_) | TransitionError::NotAllowed { .. } => {
                HavenError::InvalidState(err.to_string())
            }
        }
    }
}

impl ApplicationState {
    /// The persisted status tag.
    pub fn status(&self) -> ApplicationStatus {
        match self {
            Self::Pending => ApplicationStatus::Pending,
            Self::Approved { .. } => ApplicationStatus::Approved,
            Self::Rejected { .. } => ApplicationStatus::Rejected,
            Self::Ignored => ApplicationStatus::Ignored,
        }
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Approved { approved_at, .. } => Some(*approved_at),
            _ => None,
        }
    }

    pub fn rejected_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Rejected { rejected_at, .. } => Some(*rejected_at),
            _ => None,
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Self::Rejected {
                rejection_reason, ..
            } => Some(rejection_reason),
            _ => None,
        }
    }

    pub fn deletion_scheduled_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Approved {
                deletion_scheduled_at,
                ..
            }
            | Self::Rejected {
                deletion_scheduled_at,
                ..
            } => Some(*deletion_scheduled_at),
            _ => None,
        }
    }

    /// Approved or rejected. These are the states that schedule a purge and
    /// get archived, even though they may still toggle into each other.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved { .. } | Self::Rejected { .. })
    }

    /// Approve from pending or rejected.
    pub fn approve(&self, now: DateTime<Utc>, retention: Duration) -> Result<Self, TransitionError> {
        match self {
            Self::Pending | Self::Rejected { .. } => Ok(Self::Approved {
                approved_at: now,
                deletion_scheduled_at: now + retention,
            }),
            Self::Approved { .. } => Err(TransitionError::AlreadyInState(
                ApplicationStatus::Approved,
            )),
            Self::Ignored => Err(TransitionError::NotAllowed {
                from: ApplicationStatus::Ignored,
                action: "approve",
            }),
        }
    }

    /// Reject from pending or approved. The reason is trimmed and must not be blank.
    pub fn reject(
        &self,
        now: DateTime<Utc>,
        retention: Duration,
        reason: &str,
    ) -> Result<Self, TransitionError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(TransitionError::BlankReason);
        }
        match self {
            Self::Pending | Self::Approved { .. } => Ok(Self::Rejected {
                rejected_at: now,
                rejection_reason: reason.to_string(),
                deletion_scheduled_at: now + retention,
            }),
            Self::Rejected { .. } => Err(TransitionError::AlreadyInState(
                ApplicationStatus::Rejected,
            )),
            Self::Ignored => Err(TransitionError::NotAllowed {
                from: ApplicationStatus::Ignored,
                action: "reject",
            }),
        }
    }

    /// Ignore, only from pending.
    pub fn ignore(&self) -> Result<Self, TransitionError> {
        match self {
            Self::Pending => Ok(Self::Ignored),
            Self::Ignored => Err(TransitionError::AlreadyInState(ApplicationStatus::Ignored)),
            other => Err(TransitionError::NotAllowed {
                from: other.status(),
                action: "ignore",
            }),
        }
    }

    /// Withdrawal (adopter-initiated delete) is only possible while pending.
    pub fn ensure_withdrawable(&self) -> Result<(), TransitionError> {
        match self {
            Self::Pending => Ok(()),
            other => Err(TransitionError::NotAllowed {
                from: other.status(),
                action: "delete",
            }),
        }
    }

    /// Reverting an approval is sensitive and gated behind step-up re-authentication.
    pub fn reject_requires_reauthentication(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    /// Rebuild a state from persisted columns, rejecting any combination that
    /// violates the column invariants.
    pub fn from_columns(
        status: ApplicationStatus,
        approved_at: Option<DateTime<Utc>>,
        rejected_at: Option<DateTime<Utc>>,
        rejection_reason: Option<String>,
        deletion_scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<Self, StateDecodeError> {
        let unexpected = |field: &'static str| StateDecodeError::UnexpectedField { status, field };
        let missing = |field: &'static str| StateDecodeError::MissingField { status, field };

        match status {
            ApplicationStatus::Pending | ApplicationStatus::Ignored => {
                if approved_at.is_some() {
                    return Err(unexpected("approved_at"));
                }
                if rejected_at.is_some() {
                    return Err(unexpected("rejected_at"));
                }
                if rejection_reason.is_some() {
                    return Err(unexpected("rejection_reason"));
                }
                if deletion_scheduled_at.is_some() {
                    return Err(unexpected("deletion_scheduled_at"));
                }
                Ok(if status == ApplicationStatus::Pending {
                    Self::Pending
                } else {
                    Self::Ignored
                })
            }
            ApplicationStatus::Approved => {
                if rejected_at.is_some() {
                    return Err(unexpected("rejected_at"));
                }
                if rejection_reason.is_some() {
                    return Err(unexpected("rejection_reason"));
                }
                Ok(Self::Approved {
                    approved_at: approved_at.ok_or_else(|| missing("approved_at"))?,
                    deletion_scheduled_at: deletion_scheduled_at
                        .ok_or_else(|| missing("deletion_scheduled_at"))?,
                })
            }
            ApplicationStatus::Rejected => {
                if approved_at.is_some() {
                    return Err(unexpected("approved_at"));
                }
                Ok(Self::Rejected {
                    rejected_at: rejected_at.ok_or_else(|| missing("rejected_at"))?,
                    rejection_reason: rejection_reason
                        .ok_or_else(|| missing("rejection_reason"))?,
                    deletion_scheduled_at: deletion_scheduled_at
                        .ok_or_else(|| missing("deletion_scheduled_at"))?,
                })
            }
        }
    }
}

/// A persisted row whose columns do not describe a valid state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateDecodeError {
    #[error("{status} application is missing `{field}`")]
    MissingField {
        status: ApplicationStatus,
        field: &'static str,
    },
    #[error("{status} application must not have `{field}` set")]
    UnexpectedField {
        status: ApplicationStatus,
        field: &'static str,
    },
}

/// One adoption request from one adopter for one pet at one shelter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: ApplicationId,
    pub pet_id: PetId,
    pub adopter_id: UserId,
    /// Owning shelter of the pet, stored for direct filtering.
    pub shelter_id: UserId,
    pub message: String,
    pub state: ApplicationState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// A fresh pending application for `pet`.
    pub fn new_pending(pet: &Pet, adopter_id: UserId, message: String, now: DateTime<Utc>) -> Self {
        Self {
            id: ApplicationId::generate(),
            pet_id: pet.id.clone(),
            adopter_id,
            shelter_id: pet.shelter_id.clone(),
            message,
            state: ApplicationState::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> ApplicationStatus {
        self.state.status()
    }

    /// Copy of this application moved to `state` at `now`.
    pub fn with_state(&self, state: ApplicationState, now: DateTime<Utc>) -> Self {
        Self {
            state,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Whether `user` is the adopter or the shelter of this application.
    pub fn is_party(&self, user: &UserId) -> bool {
        &self.adopter_id == user || &self.shelter_id == user
    }

    /// Whole days until the scheduled purge, rounded up and clamped at zero.
    /// `None` when no purge is scheduled.
    pub fn days_until_deletion(&self, now: DateTime<Utc>) -> Option<i64> {
        let deletion = self.state.deletion_scheduled_at()?;
        let remaining = (deletion - now).num_milliseconds();
        if remaining <= 0 {
            return Some(0);
        }
        Some((remaining + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY)
    }

    /// Flatten into the persisted column layout.
    pub fn to_record(&self) -> ApplicationRecord {
        ApplicationRecord {
            id: self.id.clone(),
            adopter_id: self.adopter_id.clone(),
            shelter_id: self.shelter_id.clone(),
            pet_id: self.pet_id.clone(),
            status: self.status(),
            message: self.message.clone(),
            created_at: self.created_at,
            approved_at: self.state.approved_at(),
            rejected_at: self.state.rejected_at(),
            rejection_reason: self.state.rejection_reason().map(str::to_string),
            deletion_scheduled_at: self.state.deletion_scheduled_at(),
            updated_at: self.updated_at,
        }
    }
}

/// The persisted `applications` field layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub adopter_id: UserId,
    pub shelter_id: UserId,
    pub pet_id: PetId,
    pub status: ApplicationStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub deletion_scheduled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRecord> for Application {
    type Error = StateDecodeError;

    fn try_from(record: ApplicationRecord) -> Result<Self, Self::Error> {
        let state = ApplicationState::from_columns(
            record.status,
            record.approved_at,
            record.rejected_at,
            record.rejection_reason,
            record.deletion_scheduled_at,
        )?;
        Ok(Self {
            id: record.id,
            pet_id: record.pet_id,
            adopter_id: record.adopter_id,
            shelter_id: record.shelter_id,
            message: record.message,
            state,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}
