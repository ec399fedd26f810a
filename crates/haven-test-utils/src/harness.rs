// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the lifecycle manager, messaging channel and
//! retention scheduler over one temp SQLite database, all reading the same
//! [`TestClock`].

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::SecretString;

use haven_config::HavenConfig;
use haven_core::{
    AuthAdapter, HavenError, Pet, PetId, PetStatus, Profile, ProfileRole, StorageAdapter, UserId,
};
use haven_lifecycle::LifecycleManager;
use haven_messaging::MessagingChannel;
use haven_retention::RetentionScheduler;
use haven_storage::SqliteStorage;

use crate::clock::TestClock;

pub const SHELTER_ID: &str = "shelter-1";
pub const ADOPTER_ID: &str = "adopter-1";
pub const OTHER_ADOPTER_ID: &str = "adopter-2";
pub const SHELTER_PASSWORD: &str = "shelter-password-123";
pub const API_TOKEN: &str = "test-api-token-0123456789";
pub const CRON_SECRET: &str = "test-cron-secret-0123456789";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    retention_days: u32,
    start: DateTime<Utc>,
    pets: Vec<(String, String)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            retention_days: 30,
            start: Utc
                .with_ymd_and_hms(2026, 5, 4, 9, 30, 0)
                .single()
                .unwrap_or_else(Utc::now),
            pets: vec![
                ("pet-1".to_string(), "Biscuit".to_string()),
                ("pet-2".to_string(), "Pepper".to_string()),
            ],
        }
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Start the clock at `at` instead of the default fixed instant.
    pub fn starting_at(mut self, at: DateTime<Utc>) -> Self {
        self.start = at;
        self
    }

    /// Seed an extra available pet owned by the harness shelter.
    pub fn with_pet(mut self, id: &str, name: &str) -> Self {
        self.pets.push((id.to_string(), name.to_string()));
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, HavenError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| HavenError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = HavenConfig::default();
        config.storage.database_path = db_path.to_string_lossy().to_string();
        config.retention.window_days = self.retention_days;
        config.gateway.api_token = Some(API_TOKEN.to_string());
        config.retention.cron_secret = Some(CRON_SECRET.to_string());

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        for (id, full_name, role, shelter_name) in [
            (SHELTER_ID, "Dana Ortiz", ProfileRole::Shelter, Some("Happy Tails")),
            (ADOPTER_ID, "Ada Byron", ProfileRole::Adopter, None),
            (OTHER_ADOPTER_ID, "Grace Hopper", ProfileRole::Adopter, None),
        ] {
            storage
                .upsert_profile(&Profile {
                    id: UserId::from(id),
                    full_name: full_name.to_string(),
                    role,
                    shelter_name: shelter_name.map(str::to_string),
                })
                .await?;
        }
        storage
            .set_credential(&UserId::from(SHELTER_ID), &SecretString::from(SHELTER_PASSWORD))
            .await?;
        for (id, name) in &self.pets {
            storage
                .upsert_pet(&Pet {
                    id: PetId::from(id.as_str()),
                    shelter_id: UserId::from(SHELTER_ID),
                    name: name.clone(),
                    status: PetStatus::Available,
                })
                .await?;
        }

        let clock = TestClock::new(self.start);
        let as_storage = storage.clone() as Arc<dyn StorageAdapter>;
        let lifecycle = Arc::new(
            LifecycleManager::new(
                as_storage.clone(),
                storage.clone() as Arc<dyn AuthAdapter>,
                self.retention_days,
            )
            .with_clock(clock.clock()),
        );
        let messaging =
            Arc::new(MessagingChannel::new(as_storage.clone()).with_clock(clock.clock()));
        let retention = Arc::new(RetentionScheduler::new(as_storage).with_clock(clock.clock()));

        tracing::debug!(db = %db_path.display(), "test harness ready");
        Ok(TestHarness {
            storage,
            lifecycle,
            messaging,
            retention,
            clock,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment over a temp database.
pub struct TestHarness {
    /// SQLite storage (temp DB, cleaned up on drop). Also the auth adapter.
    pub storage: Arc<SqliteStorage>,
    pub lifecycle: Arc<LifecycleManager>,
    pub messaging: Arc<MessagingChannel>,
    pub retention: Arc<RetentionScheduler>,
    /// Clock shared by every component above.
    pub clock: TestClock,
    /// Configuration matching the harness, with test secrets set.
    pub config: HavenConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn shelter(&self) -> UserId {
        UserId::from(SHELTER_ID)
    }

    pub fn adopter(&self) -> UserId {
        UserId::from(ADOPTER_ID)
    }

    pub fn other_adopter(&self) -> UserId {
        UserId::from(OTHER_ADOPTER_ID)
    }

    pub fn shelter_password(&self) -> SecretString {
        SecretString::from(SHELTER_PASSWORD)
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Current status of a seeded pet.
    pub async fn pet_status(&self, id: &str) -> Result<PetStatus, HavenError> {
        self.storage
            .get_pet(&PetId::from(id))
            .await?
            .map(|p| p.status)
            .ok_or_else(|| HavenError::not_found("pet", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_seeds_parties_and_pets() {
        let h = TestHarness::builder().with_pet("pet-3", "Mango").build().await.unwrap();

        assert_eq!(h.pet_status("pet-1").await.unwrap(), PetStatus::Available);
        assert_eq!(h.pet_status("pet-3").await.unwrap(), PetStatus::Available);
        let shelter = h.storage.get_profile(&h.shelter()).await.unwrap().unwrap();
        assert_eq!(shelter.display_shelter_name(), "Happy Tails");
        h.storage
            .reauthenticate(&h.shelter(), &h.shelter_password())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn components_share_the_clock() {
        let h = TestHarness::builder().build().await.unwrap();
        let before = h.lifecycle.now();
        h.advance(Duration::days(3));
        assert_eq!(h.lifecycle.now(), before + Duration::days(3));
    }
}
