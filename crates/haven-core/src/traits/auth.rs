// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication adapter trait for step-up credential verification.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::HavenError;
use crate::traits::adapter::PluginAdapter;
use crate::types::UserId;

/// Adapter for re-verifying a user's credential before a sensitive action.
///
/// Sign-in and sessions are handled upstream; this adapter only answers
/// "is this still the user" for step-up checks.
#[async_trait]
pub trait AuthAdapter: PluginAdapter {
    /// Verify `secret` against the stored credential for `user_id`.
    ///
    /// Returns [`HavenError::ReauthenticationFailed`] for an unknown user or
    /// a wrong secret; other errors indicate an upstream failure.
    async fn reauthenticate(&self, user_id: &UserId, secret: &SecretString)
        -> Result<(), HavenError>;

    /// Store (or replace) the credential for `user_id`.
    async fn set_credential(&self, user_id: &UserId, secret: &SecretString)
        -> Result<(), HavenError>;
}
