// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Alumnet integration tests.
//!
//! Provides mock collaborators and a harness so lifecycle tests run fast and
//! deterministically without any remote service.
//!
//! # Components
//!
//! - [`MockSessionLog`], [`MockPresence`], [`MockPayment`], [`MockRequests`]:
//!   in-memory collaborators with failure switches and call capture
//! - [`MemoryStore`]: in-memory durable store
//! - [`ManualClock`]: clock moved by hand
//! - [`ScriptedProbe`]: call-room probe that replays a script
//! - [`TestHarness`]: a wired engine over all of the above

pub mod clock;
pub mod harness;
pub mod memory_store;
pub mod mock_services;
pub mod probe;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder, accepted_request};
pub use memory_store::MemoryStore;
pub use mock_services::{MockPayment, MockPresence, MockRequests, MockSessionLog};
pub use probe::ScriptedProbe;
