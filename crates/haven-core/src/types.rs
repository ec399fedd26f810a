// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Haven service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a fresh random identifier (UUID v4).
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Unique identifier for an adoption application.
    ApplicationId
);
string_id!(
    /// Unique identifier for a user (adopter, shelter, or admin).
    UserId
);
string_id!(
    /// Unique identifier for a pet listing.
    PetId
);
string_id!(
    /// Unique identifier for a chat message.
    MessageId
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Auth,
    Gateway,
}

/// Persisted status of an adoption application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Ignored,
}

/// Listing status of a pet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Available,
    Adopted,
}

/// Role of a user profile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    Adopter,
    Shelter,
    Admin,
}

/// A pet listing, summarized to the fields the lifecycle needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    /// The shelter that owns the listing.
    pub shelter_id: UserId,
    pub name: String,
    pub status: PetStatus,
}

/// A user profile, summarized to the fields used for denormalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub full_name: String,
    pub role: ProfileRole,
    /// Organisation name for shelter accounts.
    pub shelter_name: Option<String>,
}

impl Profile {
    /// Name shown for this profile when it acts as a shelter.
    pub fn display_shelter_name(&self) -> &str {
        self.shelter_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.full_name)
    }
}

/// One chat line within an application's messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub application_id: ApplicationId,
    pub sender_id: UserId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Immutable, denormalized record of an application's terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub application_id: ApplicationId,
    pub pet_id: PetId,
    pub pet_name: String,
    pub adopter_id: UserId,
    pub adopter_name: String,
    pub shelter_id: UserId,
    pub shelter_name: String,
    pub status: ApplicationStatus,
    /// The adopter's note from the original application.
    pub message: String,
    pub applied_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit record of one state transition, appended alongside the transition itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: String,
    pub application_id: ApplicationId,
    pub from_status: ApplicationStatus,
    pub to_status: ApplicationStatus,
    pub actor_id: UserId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Which side of an application a query is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Party {
    Shelter(UserId),
    Adopter(UserId),
}

impl Party {
    /// The user the query is scoped to.
    pub fn user_id(&self) -> &UserId {
        match self {
            Party::Shelter(id) | Party::Adopter(id) => id,
        }
    }
}

/// Filter for listing live applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub party: Party,
    pub status: Option<ApplicationStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn application_status_round_trips_lowercase() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Approved,
            ApplicationStatus::Rejected,
            ApplicationStatus::Ignored,
        ] {
            let s = status.to_string();
            assert_eq!(s, s.to_lowercase());
            assert_eq!(ApplicationStatus::from_str(&s).unwrap(), status);
        }
    }

    #[test]
    fn pet_status_serializes_lowercase() {
        let json = serde_json::to_string(&PetStatus::Adopted).unwrap();
        assert_eq!(json, "\"adopted\"");
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = ApplicationId::from("app-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"app-1\"");
        assert_eq!(id.to_string(), "app-1");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ApplicationId::generate(), ApplicationId::generate());
    }

    #[test]
    fn shelter_name_falls_back_to_full_name() {
        let mut profile = Profile {
            id: UserId::from("s1"),
            full_name: "Jo Smith".to_string(),
            role: ProfileRole::Shelter,
            shelter_name: None,
        };
        assert_eq!(profile.display_shelter_name(), "Jo Smith");

        profile.shelter_name = Some("  ".to_string());
        assert_eq!(profile.display_shelter_name(), "Jo Smith");

        profile.shelter_name = Some("Happy Paws".to_string());
        assert_eq!(profile.display_shelter_name(), "Happy Paws");
    }
}
