// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Alumnet mentorship engine.
//!
//! Provides a WAL-mode key/value store with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. It backs the
//! device-local fallback cache and persisted session timers.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteFallbackStore;
pub use database::Database;
