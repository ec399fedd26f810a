// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The application lifecycle manager.
//!
//! Every mutating operation follows the same shape: load, check the actor,
//! compute the next state with the pure transition functions on
//! [`ApplicationState`](haven_core::ApplicationState), then hand all side
//! effects to [`StorageAdapter::commit_transition`] as one atomic unit.
//! Nothing is written when any step before the commit fails.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use secrecy::SecretString;
use tracing::{error, info, warn};

use haven_core::traits::TransitionCommit;
use haven_core::{
    system_clock, Application, ApplicationFilter, ApplicationId,
    ApplicationStatus, AuthAdapter, Clock, ErrorKind, HavenError, HistoryEntry, Party, Pet, PetId,
    PetStatus, StorageAdapter, TransitionError, TransitionRecord, UserId,
};

use crate::history::{self, HistoryFilter};

/// Owns the adoption application state machine and its side effects.
pub struct LifecycleManager {
    storage: Arc<dyn StorageAdapter>,
    auth: Arc<dyn AuthAdapter>,
    retention: Duration,
    clock: Clock,
}

impl LifecycleManager {
    /// Create a manager that schedules purges `retention_days` after each
    /// approval or rejection.
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        auth: Arc<dyn AuthAdapter>,
        retention_days: u32,
    ) -> Self {
        Self {
            storage,
            auth,
            retention: Duration::days(i64::from(retention_days)),
            clock: system_clock(),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Current time at the precision timestamps are persisted with.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)().trunc_subsecs(3)
    }

    /// Submit a new application from `actor` for `pet_id`.
    pub async fn submit(
        &self,
        actor: &UserId,
        pet_id: &PetId,
        message: &str,
    ) -> Result<Application, HavenError> {
        self.submit_inner(actor, pet_id, message)
            .await
            .inspect_err(|e| log_failure("submit", pet_id.as_str(), actor, e))
    }

    async fn submit_inner(
        &self,
        actor: &UserId,
        pet_id: &PetId,
        message: &str,
    ) -> Result<Application, HavenError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(HavenError::Validation(
                "application message must not be empty".to_string(),
            ));
        }

        let pet = self
            .storage
            .get_pet(pet_id)
            .await?
            .ok_or_else(|| HavenError::not_found("pet", pet_id))?;
        if &pet.shelter_id == actor {
            return Err(HavenError::Validation(
                "a shelter cannot apply for its own pet".to_string(),
            ));
        }
        if pet.status != PetStatus::Available {
            return Err(HavenError::PetUnavailable {
                pet_id: pet_id.to_string(),
            });
        }
        if self
            .storage
            .find_application_for(actor, pet_id)
            .await?
            .is_some()
        {
            return Err(HavenError::DuplicateApplication {
                adopter_id: actor.to_string(),
                pet_id: pet_id.to_string(),
            });
        }

        let application = Application::new_pending(&pet, actor.clone(), message.to_string(), self.now());
        self.storage.insert_application(&application).await?;
        info!(
            application_id = %application.id,
            pet_id = %pet_id,
            adopter_id = %actor,
            "application submitted"
        );
        Ok(application)
    }

    /// Approve an application. The pet is marked adopted and the history
    /// archive is updated in the same commit.
    pub async fn approve(
        &self,
        actor: &UserId,
        id: &ApplicationId,
    ) -> Result<Application, HavenError> {
        self.approve_inner(actor, id)
            .await
            .inspect_err(|e| log_failure("approve", id.as_str(), actor, e))
    }

    async fn approve_inner(
        &self,
        actor: &UserId,
        id: &ApplicationId,
    ) -> Result<Application, HavenError> {
        let application = self.load(id).await?;
        ensure_shelter(actor, &application, "approve")?;

        let now = self.now();
        let next = application.state.approve(now, self.retention)?;
        let updated = application.with_state(next, now);

        let pet = self.storage.get_pet(&application.pet_id).await?;
        let entry = self.project_history(&updated, pet.as_ref(), now).await?;
        self.storage
            .commit_transition(&TransitionCommit {
                record: record(&application, &updated, actor, None, now),
                application: updated.clone(),
                expected_status: application.status(),
                pet_status: Some(PetStatus::Adopted),
                history: Some(entry),
            })
            .await?;

        info!(
            application_id = %id,
            shelter_id = %actor,
            from = %application.status(),
            "application approved"
        );
        Ok(updated)
    }

    /// Reject an application with a reason.
    ///
    /// Rejecting an approved application requires `reauth`, the acting
    /// shelter's password, verified before anything is written. The pet's
    /// status is left unchanged.
    pub async fn reject(
        &self,
        actor: &UserId,
        id: &ApplicationId,
        reason: &str,
        reauth: Option<&SecretString>,
    ) -> Result<Application, HavenError> {
        self.reject_inner(actor, id, reason, reauth)
            .await
            .inspect_err(|e| log_failure("reject", id.as_str(), actor, e))
    }

    async fn reject_inner(
        &self,
        actor: &UserId,
        id: &ApplicationId,
        reason: &str,
        reauth: Option<&SecretString>,
    ) -> Result<Application, HavenError> {
        if reason.trim().is_empty() {
            return Err(TransitionError::BlankReason.into());
        }

        let application = self.load(id).await?;
        ensure_shelter(actor, &application, "reject")?;

        let now = self.now();
        let next = application.state.reject(now, self.retention, reason)?;

        if application.state.reject_requires_reauthentication() {
            let secret = reauth.ok_or(HavenError::ReauthenticationFailed)?;
            self.auth.reauthenticate(actor, secret).await?;
        }

        let updated = application.with_state(next, now);
        let pet = self.storage.get_pet(&application.pet_id).await?;
        let entry = self.project_history(&updated, pet.as_ref(), now).await?;
        self.storage
            .commit_transition(&TransitionCommit {
                record: record(
                    &application,
                    &updated,
                    actor,
                    updated.state.rejection_reason().map(str::to_string),
                    now,
                ),
                application: updated.clone(),
                expected_status: application.status(),
                pet_status: None,
                history: Some(entry),
            })
            .await?;

        info!(
            application_id = %id,
            shelter_id = %actor,
            from = %application.status(),
            "application rejected"
        );
        Ok(updated)
    }

    /// Hide a pending application. No purge is scheduled and nothing is archived.
    pub async fn ignore(
        &self,
        actor: &UserId,
        id: &ApplicationId,
    ) -> Result<Application, HavenError> {
        self.ignore_inner(actor, id)
            .await
            .inspect_err(|e| log_failure("ignore", id.as_str(), actor, e))
    }

    async fn ignore_inner(
        &self,
        actor: &UserId,
        id: &ApplicationId,
    ) -> Result<Application, HavenError> {
        let application = self.load(id).await?;
        ensure_shelter(actor, &application, "ignore")?;

        let next = application.state.ignore()?;
        let now = self.now();
        let updated = application.with_state(next, now);
        self.storage
            .commit_transition(&TransitionCommit {
                record: record(&application, &updated, actor, None, now),
                application: updated.clone(),
                expected_status: application.status(),
                pet_status: None,
                history: None,
            })
            .await?;

        info!(application_id = %id, shelter_id = %actor, "application ignored");
        Ok(updated)
    }

    /// Delete a still-pending application on the adopter's behalf.
    pub async fn withdraw(&self, actor: &UserId, id: &ApplicationId) -> Result<(), HavenError> {
        self.withdraw_inner(actor, id)
            .await
            .inspect_err(|e| log_failure("withdraw", id.as_str(), actor, e))
    }

    async fn withdraw_inner(&self, actor: &UserId, id: &ApplicationId) -> Result<(), HavenError> {
        let application = self.load(id).await?;
        if &application.adopter_id != actor {
            return Err(HavenError::Unauthorized(
                "only the adopter may withdraw an application".to_string(),
            ));
        }
        application.state.ensure_withdrawable()?;

        if !self.storage.delete_pending_application(id).await? {
            return Err(HavenError::Conflict(format!(
                "application {id} changed before it could be withdrawn"
            )));
        }
        info!(application_id = %id, adopter_id = %actor, "application withdrawn");
        Ok(())
    }

    /// Put a pet back on the market. Only the owning shelter may do this.
    pub async fn mark_pet_available(
        &self,
        actor: &UserId,
        pet_id: &PetId,
    ) -> Result<Pet, HavenError> {
        self.mark_pet_available_inner(actor, pet_id)
            .await
            .inspect_err(|e| log_failure("mark_pet_available", pet_id.as_str(), actor, e))
    }

    async fn mark_pet_available_inner(
        &self,
        actor: &UserId,
        pet_id: &PetId,
    ) -> Result<Pet, HavenError> {
        let pet = self
            .storage
            .get_pet(pet_id)
            .await?
            .ok_or_else(|| HavenError::not_found("pet", pet_id))?;
        if &pet.shelter_id != actor {
            return Err(HavenError::Unauthorized(
                "only the owning shelter may change a pet's status".to_string(),
            ));
        }
        if !self
            .storage
            .set_pet_status(pet_id, PetStatus::Available)
            .await?
        {
            return Err(HavenError::not_found("pet", pet_id));
        }
        info!(pet_id = %pet_id, shelter_id = %actor, "pet marked available");
        Ok(Pet {
            status: PetStatus::Available,
            ..pet
        })
    }

    /// One application, visible to its two parties only.
    pub async fn get(&self, actor: &UserId, id: &ApplicationId) -> Result<Application, HavenError> {
        let application = self.load(id).await?;
        if !application.is_party(actor) {
            return Err(HavenError::Unauthorized(
                "not a party to this application".to_string(),
            ));
        }
        Ok(application)
    }

    /// Applications received by the acting shelter, newest first.
    pub async fn list_for_shelter(
        &self,
        actor: &UserId,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, HavenError> {
        self.storage
            .list_applications(&ApplicationFilter {
                party: Party::Shelter(actor.clone()),
                status,
            })
            .await
    }

    /// Applications sent by the acting adopter, newest first.
    pub async fn list_for_adopter(
        &self,
        actor: &UserId,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, HavenError> {
        self.storage
            .list_applications(&ApplicationFilter {
                party: Party::Adopter(actor.clone()),
                status,
            })
            .await
    }

    /// The audit trail of an application, for its parties.
    pub async fn transitions(
        &self,
        actor: &UserId,
        id: &ApplicationId,
    ) -> Result<Vec<TransitionRecord>, HavenError> {
        self.get(actor, id).await?;
        self.storage.list_transitions(id).await
    }

    /// The acting party's archive, newest first, narrowed by `filter`.
    pub async fn history(
        &self,
        party: &Party,
        filter: &HistoryFilter,
    ) -> Result<Vec<HistoryEntry>, HavenError> {
        let entries = self.storage.list_history(party).await?;
        Ok(filter.apply(entries, party))
    }

    /// Whole days until `application` is purged, as of now.
    pub fn days_until_deletion(&self, application: &Application) -> Option<i64> {
        application.days_until_deletion(self.now())
    }

    async fn load(&self, id: &ApplicationId) -> Result<Application, HavenError> {
        self.storage
            .get_application(id)
            .await?
            .ok_or_else(|| HavenError::not_found("application", id))
    }

    async fn project_history(
        &self,
        application: &Application,
        pet: Option<&Pet>,
        now: DateTime<Utc>,
    ) -> Result<HistoryEntry, HavenError> {
        let adopter = self.storage.get_profile(&application.adopter_id).await?;
        let shelter = self.storage.get_profile(&application.shelter_id).await?;
        Ok(history::project(
            application,
            pet,
            adopter.as_ref(),
            shelter.as_ref(),
            now,
        ))
    }
}

fn ensure_shelter(actor: &UserId, application: &Application, action: &str) -> Result<(), HavenError> {
    if &application.shelter_id == actor {
        Ok(())
    } else {
        Err(HavenError::Unauthorized(format!(
            "only the receiving shelter may {action} this application"
        )))
    }
}

fn record(
    before: &Application,
    after: &Application,
    actor: &UserId,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> TransitionRecord {
    TransitionRecord {
        id: uuid::Uuid::new_v4().to_string(),
        application_id: before.id.clone(),
        from_status: before.status(),
        to_status: after.status(),
        actor_id: actor.clone(),
        reason,
        occurred_at: now,
    }
}

/// Log a failed operation at the level its kind deserves.
fn log_failure(operation: &str, subject: &str, actor: &UserId, err: &HavenError) {
    match err.kind() {
        ErrorKind::InvalidState | ErrorKind::Conflict | ErrorKind::Authorization => {
            warn!(
                operation,
                subject,
                actor = %actor,
                kind = %err.kind(),
                error = %err,
                "operation refused"
            );
        }
        ErrorKind::Upstream | ErrorKind::Internal => {
            error!(operation, subject, actor = %actor, error = %err, "operation failed");
        }
        _ => {}
    }
}
