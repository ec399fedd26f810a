// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait: the persistence gateway's data-access contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::Application;
use crate::error::HavenError;
use crate::subscription::MessageSubscription;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ApplicationFilter, ApplicationId, ApplicationStatus, ChatMessage, HistoryEntry, Party, Pet,
    PetId, PetStatus, Profile, TransitionRecord, UserId,
};

/// Everything one lifecycle transition writes, committed atomically.
///
/// The application row is only updated if its stored status still equals
/// `expected_status`; otherwise the commit fails with
/// [`HavenError::Conflict`] and nothing is written.
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    /// The application in its new state.
    pub application: Application,
    /// Status the row must still have for the commit to apply.
    pub expected_status: ApplicationStatus,
    /// Pet status side effect, if any.
    pub pet_status: Option<PetStatus>,
    /// History archive upsert, keyed by application id.
    pub history: Option<HistoryEntry>,
    /// Audit trail entry.
    pub record: TransitionRecord,
}

/// Adapter for persistence backends.
///
/// Implementations enforce the data-level guarantees the lifecycle relies
/// on: one application per (adopter, pet), cascading message deletion on
/// purge, and atomic transition commits.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), HavenError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), HavenError>;

    // --- Applications ---

    /// Insert a new application. A second application for the same
    /// (adopter, pet) fails with [`HavenError::DuplicateApplication`].
    async fn insert_application(&self, application: &Application) -> Result<(), HavenError>;

    async fn get_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, HavenError>;

    /// Applications for one party, newest first.
    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, HavenError>;

    /// The live application, if any, from `adopter_id` for `pet_id`.
    async fn find_application_for(
        &self,
        adopter_id: &UserId,
        pet_id: &PetId,
    ) -> Result<Option<Application>, HavenError>;

    /// Apply a transition and all of its side effects in one transaction.
    async fn commit_transition(&self, commit: &TransitionCommit) -> Result<(), HavenError>;

    /// Delete an application only if it is still pending.
    /// Returns `false` if no pending row matched.
    async fn delete_pending_application(&self, id: &ApplicationId) -> Result<bool, HavenError>;

    /// Ids of applications whose scheduled deletion is at or before `now`.
    async fn list_expired_applications(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ApplicationId>, HavenError>;

    /// Delete the given applications, skipping any whose deletion time has
    /// moved past `now` since they were listed. Returns rows deleted.
    async fn delete_expired_applications(
        &self,
        ids: &[ApplicationId],
        now: DateTime<Utc>,
    ) -> Result<u64, HavenError>;

    /// Audit trail for one application, oldest first.
    async fn list_transitions(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<TransitionRecord>, HavenError>;

    // --- Pets and profiles ---

    async fn upsert_pet(&self, pet: &Pet) -> Result<(), HavenError>;

    async fn get_pet(&self, id: &PetId) -> Result<Option<Pet>, HavenError>;

    /// Returns `false` if the pet does not exist.
    async fn set_pet_status(&self, id: &PetId, status: PetStatus) -> Result<bool, HavenError>;

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), HavenError>;

    async fn get_profile(&self, id: &UserId) -> Result<Option<Profile>, HavenError>;

    // --- Messages ---

    /// Append a message and publish it to live subscribers.
    async fn insert_message(&self, message: &ChatMessage) -> Result<(), HavenError>;

    /// Messages for one application, oldest first.
    async fn list_messages(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<ChatMessage>, HavenError>;

    /// Subscribe to messages inserted for `application_id` from now on.
    fn subscribe_messages(&self, application_id: &ApplicationId) -> MessageSubscription;

    // --- History archive ---

    /// History entries for one party, newest first.
    async fn list_history(&self, party: &Party) -> Result<Vec<HistoryEntry>, HavenError>;

    async fn get_history_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Option<HistoryEntry>, HavenError>;
}
