// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Haven adoption service.
//!
//! This crate provides the foundational trait definitions, error types,
//! domain types, and the adoption application state machine used throughout
//! the Haven workspace. The storage and auth adapters implement traits
//! defined here.

pub mod application;
pub mod clock;
pub mod error;
pub mod subscription;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use application::{
    Application, ApplicationRecord, ApplicationState, StateDecodeError, TransitionError,
};
pub use clock::{fixed_clock, system_clock, Clock};
pub use error::{ErrorKind, HavenError};
pub use subscription::MessageSubscription;
pub use types::{
    AdapterType, ApplicationFilter, ApplicationId, ApplicationStatus, ChatMessage, HealthStatus,
    HistoryEntry, MessageId, Party, Pet, PetId, PetStatus, Profile, ProfileRole,
    TransitionRecord, UserId,
};

// Re-export all adapter traits at crate root.
pub use traits::{AuthAdapter, PluginAdapter, StorageAdapter, TransitionCommit};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haven_error_has_all_variants() {
        let _config = HavenError::Config("test".into());
        let _storage = HavenError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _validation = HavenError::Validation("test".into());
        let _unavailable = HavenError::PetUnavailable {
            pet_id: "p".into(),
        };
        let _empty = HavenError::EmptyMessage;
        let _unauthorized = HavenError::Unauthorized("test".into());
        let _reauth = HavenError::ReauthenticationFailed;
        let _invalid = HavenError::InvalidState("test".into());
        let _dup = HavenError::DuplicateApplication {
            adopter_id: "a".into(),
            pet_id: "p".into(),
        };
        let _not_found = HavenError::not_found("pet", "p");
        let _conflict = HavenError::Conflict("test".into());
        let _scheduler = HavenError::SchedulerUnauthorized;
        let _internal = HavenError::Internal("test".into());
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        for variant in [AdapterType::Storage, AdapterType::Auth, AdapterType::Gateway] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_auth_adapter<T: AuthAdapter>() {}
    }
}
