// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `haven set-password`: store a shelter's step-up password.
//!
//! The password is read from an interactive TTY prompt (with confirmation)
//! or, when stdin is not a terminal, from the first line of stdin.

use std::io::{BufRead, IsTerminal};

use haven_config::HavenConfig;
use haven_core::{AuthAdapter, HavenError, StorageAdapter, UserId};
use haven_storage::SqliteStorage;
use secrecy::{ExposeSecret, SecretString};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

pub async fn run_set_password(config: HavenConfig, user_id: &str) -> Result<(), HavenError> {
    let password = read_password()?;
    set_password(&config, &UserId::from(user_id), &password).await?;
    println!("password updated for {user_id}");
    Ok(())
}

async fn set_password(
    config: &HavenConfig,
    user_id: &UserId,
    password: &SecretString,
) -> Result<(), HavenError> {
    check_password(password)?;
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let result = storage.set_credential(user_id, password).await;
    storage.close().await?;
    result
}

fn check_password(password: &SecretString) -> Result<(), HavenError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
        return Err(HavenError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn read_password() -> Result<SecretString, HavenError> {
    let read_err = |e: std::io::Error| HavenError::Internal(format!("failed to read password: {e}"));

    if std::io::stdin().is_terminal() {
        eprint!("New password: ");
        let first = rpassword::read_password().map_err(read_err)?;
        eprint!("Confirm password: ");
        let second = rpassword::read_password().map_err(read_err)?;
        if first != second {
            return Err(HavenError::Validation("passwords do not match".to_string()));
        }
        return Ok(SecretString::from(first));
    }

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).map_err(read_err)?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        assert!(check_password(&SecretString::from("short")).is_err());
        assert!(check_password(&SecretString::from("long enough")).is_ok());
    }

    #[tokio::test]
    async fn stored_password_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HavenConfig::default();
        config.storage.database_path = dir.path().join("cred.db").to_string_lossy().into_owned();
        let user = UserId::from("shelter-1");

        set_password(&config, &user, &SecretString::from("hunter2hunter2"))
            .await
            .unwrap();

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await.unwrap();
        storage
            .reauthenticate(&user, &SecretString::from("hunter2hunter2"))
            .await
            .unwrap();
        assert!(storage
            .reauthenticate(&user, &SecretString::from("wrong-password"))
            .await
            .is_err());
    }
}
