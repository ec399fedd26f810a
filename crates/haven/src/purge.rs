// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `haven purge`: run one retention pass and exit.

use std::sync::Arc;

use haven_config::HavenConfig;
use haven_core::{HavenError, StorageAdapter};
use haven_retention::{PurgeReport, RetentionScheduler};
use haven_storage::SqliteStorage;

/// Purge expired applications in the configured database.
pub async fn run_purge(config: HavenConfig) -> Result<(), HavenError> {
    let report = purge_database(&config).await?;
    println!("{} (deletedCount={})", report.summary(), report.deleted_count);
    Ok(())
}

async fn purge_database(config: &HavenConfig) -> Result<PurgeReport, HavenError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let report = RetentionScheduler::new(storage.clone() as Arc<dyn StorageAdapter>)
        .run_once()
        .await;
    storage.close().await?;
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn purge_on_empty_database_deletes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HavenConfig::default();
        config.storage.database_path = dir
            .path()
            .join("purge.db")
            .to_string_lossy()
            .into_owned();

        let report = purge_database(&config).await.unwrap();
        assert_eq!(report.deleted_count, 0);
        assert!(dir.path().join("purge.db").exists());
    }
}
