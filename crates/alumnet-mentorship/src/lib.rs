// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mentorship call-session lifecycle and reconciliation engine.
//!
//! Components, leaves first:
//!
//! - [`PaymentGate`]: fail-closed payment lookup
//! - [`SessionTimer`]: elapsed/remaining time of the running segment
//! - [`CallLedger`]: remote record of call segments and request status
//! - [`merge`](merge::merge): the single reconciliation function
//! - [`StatusPoller`]: presence polling bound to a controller's lifetime
//! - [`LifecycleController`]: accept, reject, calls and completion
//!
//! [`SessionRegistry`] hands out one controller per (viewer, request).

pub mod controller;
pub mod engine;
pub mod fallback;
pub mod guard;
pub mod ledger;
pub mod merge;
pub mod payment;
pub mod poller;
pub mod registry;
pub mod timer;
pub mod watch;

pub use controller::{CallLaunch, LifecycleController};
pub use engine::{Collaborators, MentorshipEngine, SessionSettings};
pub use fallback::FallbackCache;
pub use guard::{CompletionAvailability, CompletionClearance, CompletionGuard, CompletionInputs};
pub use ledger::{CallLedger, EndOutcome};
pub use merge::MergeSources;
pub use payment::PaymentGate;
pub use poller::{PollOutcome, PollTarget, StatusPoller};
pub use registry::SessionRegistry;
pub use timer::{SessionTimer, TimerHandle};
pub use watch::{CallWindowWatch, PresenceRoomProbe, WatchOutcome};
