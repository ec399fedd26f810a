// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Haven integration tests.
//!
//! Provides a [`TestHarness`] that assembles the full service stack over a
//! temporary SQLite database, seeded with one shelter, two adopters and two
//! available pets, and driven by a controllable [`TestClock`].

pub mod clock;
pub mod harness;

pub use clock::TestClock;
pub use harness::{TestHarness, TestHarnessBuilder};
