// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP bindings for the remote collaborators.
//!
//! Each service speaks camelCase JSON over a shared [`ApiClient`] that
//! applies the configured timeout and retries transient statuses.

pub mod api;
pub mod payment;
pub mod presence;
pub mod requests;
pub mod session_log;

use std::sync::Arc;

use alumnet_config::model::ServicesConfig;
use alumnet_core::{
    AlumnetError, PaymentService, PresenceService, RequestRepository, SessionLogService,
};

pub use api::ApiClient;
pub use payment::HttpPayment;
pub use presence::HttpPresence;
pub use requests::HttpRequests;
pub use session_log::HttpSessionLog;

/// The four remote collaborators, built from one `[services]` section.
#[derive(Clone)]
pub struct RemoteServices {
    pub session_log: Arc<dyn SessionLogService>,
    pub presence: Arc<dyn PresenceService>,
    pub payment: Arc<dyn PaymentService>,
    pub requests: Arc<dyn RequestRepository>,
}

impl RemoteServices {
    pub fn from_config(config: &ServicesConfig) -> Result<Self, AlumnetError> {
        Ok(Self {
            session_log: Arc::new(HttpSessionLog::from_config(config)?),
            presence: Arc::new(HttpPresence::from_config(config)?),
            payment: Arc::new(HttpPayment::from_config(config)?),
            requests: Arc::new(HttpRequests::from_config(config)?),
        })
    }
}
