// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History archive: the projection written on terminal transitions and the
//! read-side filter applied to a party's archive.

use chrono::{DateTime, Utc};
use haven_core::{Application, HistoryEntry, Party, Pet, Profile};
use serde::Deserialize;

/// Build the archive entry for an application that just reached approved or
/// rejected.
///
/// Names fall back to the raw ids when a profile or pet is missing. On an
/// existing entry the storage upsert keeps the original id, names,
/// `applied_at` and `created_at`; only status fields are refreshed.
pub fn project(
    application: &Application,
    pet: Option<&Pet>,
    adopter: Option<&Profile>,
    shelter: Option<&Profile>,
    now: DateTime<Utc>,
) -> HistoryEntry {
    let state = &application.state;
    HistoryEntry {
        id: uuid::Uuid::new_v4().to_string(),
        application_id: application.id.clone(),
        pet_id: application.pet_id.clone(),
        pet_name: pet
            .map(|p| p.name.clone())
            .unwrap_or_else(|| application.pet_id.to_string()),
        adopter_id: application.adopter_id.clone(),
        adopter_name: adopter
            .map(|p| p.full_name.clone())
            .unwrap_or_else(|| application.adopter_id.to_string()),
        shelter_id: application.shelter_id.clone(),
        shelter_name: shelter
            .map(|p| p.display_shelter_name().to_string())
            .unwrap_or_else(|| application.shelter_id.to_string()),
        status: application.status(),
        message: application.message.clone(),
        applied_at: application.created_at,
        approved_at: state.approved_at(),
        rejected_at: state.rejected_at(),
        rejection_reason: state.rejection_reason().map(str::to_string),
        created_at: now,
    }
}

/// Client-side narrowing of a party's archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryFilter {
    /// Exact status match.
    pub status: Option<haven_core::ApplicationStatus>,
    /// Case-insensitive substring over the pet name and the counterpart's name.
    pub search: Option<String>,
}

impl HistoryFilter {
    /// Whether `entry` passes this filter when viewed by `viewer`.
    ///
    /// A shelter searches adopter names, an adopter searches shelter names.
    pub fn matches(&self, entry: &HistoryEntry, viewer: &Party) -> bool {
        if let Some(status) = self.status
            && entry.status != status
        {
            return false;
        }
        let Some(needle) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return true;
        };
        let counterpart = match viewer {
            Party::Shelter(_) => &entry.adopter_name,
            Party::Adopter(_) => &entry.shelter_name,
        };
        let needle = needle.to_lowercase();
        entry.pet_name.to_lowercase().contains(&needle)
            || counterpart.to_lowercase().contains(&needle)
    }

    /// Keep the entries that match, preserving order.
    pub fn apply(&self, entries: Vec<HistoryEntry>, viewer: &Party) -> Vec<HistoryEntry> {
        entries
            .into_iter()
            .filter(|entry| self.matches(entry, viewer))
            .collect()
    }
}
