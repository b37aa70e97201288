// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Every remote collaborator extends the [`ServiceAdapter`] base trait and
//! uses `#[async_trait]` for dynamic dispatch compatibility. The engine only
//! ever holds these as `Arc<dyn Trait>`.

pub mod adapter;
pub mod clock;
pub mod payment;
pub mod presence;
pub mod requests;
pub mod session_log;
pub mod store;

pub use adapter::ServiceAdapter;
pub use clock::{Clock, SystemClock};
pub use payment::PaymentService;
pub use presence::{CallRoomProbe, PresenceService, SessionStart};
pub use requests::{RequestRepository, StatusUpdate};
pub use session_log::{EndAck, EndCall, RequestUpdate, SessionLogService, StartCall};
pub use store::FallbackStore;
