// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id password hashing for step-up credentials.
//!
//! Hashes are stored as PHC strings, so parameters and salt travel with
//! the hash. Both functions are CPU-bound; call them from a blocking task.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use haven_core::HavenError;
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};

/// Hash `secret` with Argon2id and a fresh random salt.
pub fn hash_password(secret: &SecretString) -> Result<String, HavenError> {
    let salt = generate_salt()?;
    Argon2::default()
        .hash_password(secret.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HavenError::Internal(format!("password hashing failed: {e}")))
}

/// Whether `secret` matches the PHC hash string. A malformed hash never matches.
pub fn verify_password(phc: &str, secret: &SecretString) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.expose_secret().as_bytes(), &parsed)
        .is_ok()
}

fn generate_salt() -> Result<SaltString, HavenError> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| HavenError::Internal("failed to generate random salt".to_string()))?;
    SaltString::encode_b64(&bytes)
        .map_err(|e| HavenError::Internal(format!("failed to encode salt: {e}")))
}
