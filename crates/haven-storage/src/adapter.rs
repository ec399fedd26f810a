// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter and AuthAdapter traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{broadcast, OnceCell};
use tracing::debug;

use haven_config::model::StorageConfig;
use haven_core::traits::TransitionCommit;
use haven_core::{
    AdapterType, Application, ApplicationFilter, ApplicationId, AuthAdapter, ChatMessage,
    HavenError, HealthStatus, HistoryEntry, MessageSubscription, Party, Pet, PetId, PetStatus,
    PluginAdapter, Profile, StorageAdapter, TransitionRecord, UserId,
};

use crate::database::Database;
use crate::{password, queries};

/// Buffered messages per subscriber before it starts lagging.
const MESSAGE_FEED_CAPACITY: usize = 256;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
    message_feed: broadcast::Sender<ChatMessage>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        let (message_feed, _) = broadcast::channel(MESSAGE_FEED_CAPACITY);
        Self {
            config,
            db: OnceCell::new(),
            message_feed,
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, HavenError> {
        self.db.get().ok_or_else(|| HavenError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, HavenError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HavenError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), HavenError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| HavenError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), HavenError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Applications ---

    async fn insert_application(&self, application: &Application) -> Result<(), HavenError> {
        queries::applications::insert_application(self.db()?, application).await
    }

    async fn get_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, HavenError> {
        queries::applications::get_application(self.db()?, id).await
    }

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, HavenError> {
        queries::applications::list_applications(self.db()?, filter).await
    }

    async fn find_application_for(
        &self,
        adopter_id: &UserId,
        pet_id: &PetId,
    ) -> Result<Option<Application>, HavenError> {
        queries::applications::find_application_for(self.db()?, adopter_id, pet_id).await
    }

    async fn commit_transition(&self, commit: &TransitionCommit) -> Result<(), HavenError> {
        queries::applications::commit_transition(self.db()?, commit).await
    }

    async fn delete_pending_application(&self, id: &ApplicationId) -> Result<bool, HavenError> {
        queries::applications::delete_pending_application(self.db()?, id).await
    }

    async fn list_expired_applications(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ApplicationId>, HavenError> {
        queries::applications::list_expired(self.db()?, now).await
    }

    async fn delete_expired_applications(
        &self,
        ids: &[ApplicationId],
        now: DateTime<Utc>,
    ) -> Result<u64, HavenError> {
        queries::applications::delete_expired(self.db()?, ids, now).await
    }

    async fn list_transitions(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<TransitionRecord>, HavenError> {
        queries::transitions::list_for(self.db()?, application_id).await
    }

    // --- Pets and profiles ---

    async fn upsert_pet(&self, pet: &Pet) -> Result<(), HavenError> {
        queries::pets::upsert_pet(self.db()?, pet).await
    }

    async fn get_pet(&self, id: &PetId) -> Result<Option<Pet>, HavenError> {
        queries::pets::get_pet(self.db()?, id).await
    }

    async fn set_pet_status(&self, id: &PetId, status: PetStatus) -> Result<bool, HavenError> {
        queries::pets::set_pet_status(self.db()?, id, status).await
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), HavenError> {
        queries::profiles::upsert_profile(self.db()?, profile).await
    }

    async fn get_profile(&self, id: &UserId) -> Result<Option<Profile>, HavenError> {
        queries::profiles::get_profile(self.db()?, id).await
    }

    // --- Messages ---

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), HavenError> {
        queries::messages::insert_message(self.db()?, message).await?;
        // No receivers is not an error; nobody is watching this channel.
        let receivers = self.message_feed.send(message.clone()).unwrap_or(0);
        debug!(
            application_id = %message.application_id,
            receivers,
            "message published"
        );
        Ok(())
    }

    async fn list_messages(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<ChatMessage>, HavenError> {
        queries::messages::list_messages(self.db()?, application_id).await
    }

    fn subscribe_messages(&self, application_id: &ApplicationId) -> MessageSubscription {
        MessageSubscription::new(application_id.clone(), self.message_feed.subscribe())
    }

    // --- History archive ---

    async fn list_history(&self, party: &Party) -> Result<Vec<HistoryEntry>, HavenError> {
        queries::history::list_history(self.db()?, party).await
    }

    async fn get_history_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Option<HistoryEntry>, HavenError> {
        queries::history::get_for_application(self.db()?, application_id).await
    }
}

#[async_trait]
impl AuthAdapter for SqliteStorage {
    async fn reauthenticate(
        &self,
        user_id: &UserId,
        secret: &SecretString,
    ) -> Result<(), HavenError> {
        let Some(hash) = queries::credentials::get_password_hash(self.db()?, user_id).await?
        else {
            debug!(%user_id, "no stored credential");
            return Err(HavenError::ReauthenticationFailed);
        };

        let secret = SecretString::from(secret.expose_secret());
        let verified =
            tokio::task::spawn_blocking(move || password::verify_password(&hash, &secret))
                .await
                .map_err(|e| HavenError::Internal(format!("credential check failed: {e}")))?;

        if verified {
            Ok(())
        } else {
            Err(HavenError::ReauthenticationFailed)
        }
    }

    async fn set_credential(
        &self,
        user_id: &UserId,
        secret: &SecretString,
    ) -> Result<(), HavenError> {
        let secret = SecretString::from(secret.expose_secret());
        let hash = tokio::task::spawn_blocking(move || password::hash_password(&secret))
            .await
            .map_err(|e| HavenError::Internal(format!("credential hashing failed: {e}")))??;
        queries::credentials::upsert_credential(self.db()?, user_id, hash, Utc::now()).await?;
        debug!(%user_id, "credential stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_core::ProfileRole;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    async fn initialized() -> (SqliteStorage, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("adapter.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        (storage, dir)
    }

    fn pet() -> Pet {
        Pet {
            id: PetId::from("pet-1"),
            shelter_id: UserId::from("shelter-1"),
            name: "Biscuit".into(),
            status: PetStatus::Available,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let (storage, _dir) = initialized().await;
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_requires_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        assert!(storage.health_check().await.is_err());

        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn inserted_messages_reach_matching_subscribers() {
        let (storage, _dir) = initialized().await;
        storage.upsert_pet(&pet()).await.unwrap();
        let app = Application::new_pending(&pet(), UserId::from("adopter-1"), "hi".into(), Utc::now());
        storage.insert_application(&app).await.unwrap();

        let mut sub = storage.subscribe_messages(&app.id);
        let msg = ChatMessage {
            id: haven_core::MessageId::generate(),
            application_id: app.id.clone(),
            sender_id: app.adopter_id.clone(),
            message: "hello".into(),
            created_at: Utc::now(),
        };
        storage.insert_message(&msg).await.unwrap();

        let received = tokio::time::timeout(std::time::Duration::from_secs(1), sub.next())
            .await
            .expect("should receive before timeout")
            .expect("subscription open");
        assert_eq!(received.id, msg.id);
    }

    #[tokio::test]
    async fn failed_insert_publishes_nothing() {
        let (storage, _dir) = initialized().await;
        let app_id = ApplicationId::from("ghost");
        let mut sub = storage.subscribe_messages(&app_id);
        let msg = ChatMessage {
            id: haven_core::MessageId::generate(),
            application_id: app_id,
            sender_id: UserId::from("x"),
            message: "hello".into(),
            created_at: Utc::now(),
        };
        assert!(storage.insert_message(&msg).await.is_err());

        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), sub.next()).await;
        assert!(waited.is_err(), "nothing should be delivered");
    }

    #[tokio::test]
    async fn reauthenticate_checks_stored_hash() {
        let (storage, _dir) = initialized().await;
        let shelter = UserId::from("shelter-1");
        storage
            .upsert_profile(&Profile {
                id: shelter.clone(),
                full_name: "Dana".into(),
                role: ProfileRole::Shelter,
                shelter_name: None,
            })
            .await
            .unwrap();

        let err = storage
            .reauthenticate(&shelter, &SecretString::from("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, HavenError::ReauthenticationFailed));

        storage
            .set_credential(&shelter, &SecretString::from("s3cret-pass"))
            .await
            .unwrap();
        storage
            .reauthenticate(&shelter, &SecretString::from("s3cret-pass"))
            .await
            .unwrap();
        let err = storage
            .reauthenticate(&shelter, &SecretString::from("wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, HavenError::ReauthenticationFailed));
    }
}
