// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live call-presence collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AlumnetError;
use crate::traits::adapter::ServiceAdapter;
use crate::types::{PresenceStatus, RequestId, UserId};

/// Announcement that a call room was opened for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStart {
    pub request_id: RequestId,
    pub participant_ids: Vec<UserId>,
    pub channel_name: String,
    pub attendee_link: String,
}

/// Reports who is currently inside the call room of a request.
#[async_trait]
pub trait PresenceService: ServiceAdapter {
    async fn status(&self, request_id: &RequestId) -> Result<PresenceStatus, AlumnetError>;

    async fn session_start(&self, start: &SessionStart) -> Result<(), AlumnetError>;
}

/// Answers whether the call room of a request is open right now.
///
/// Backs the call-window watch. Implementations must not fail: an unknown
/// state reads as open.
#[async_trait]
pub trait CallRoomProbe: Send + Sync + 'static {
    async fn is_open(&self, request_id: &RequestId) -> bool;
}
