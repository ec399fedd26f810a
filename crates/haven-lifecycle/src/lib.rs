// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adoption application lifecycle for Haven.
//!
//! [`LifecycleManager`] drives applications through
//! pending → approved / rejected / ignored, keeps the pet listing and the
//! history archive in step, and records every transition for audit.

pub mod history;
pub mod manager;

pub use history::HistoryFilter;
pub use manager::LifecycleManager;
