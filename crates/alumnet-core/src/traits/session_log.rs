// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authoritative session-log collaborator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AlumnetError;
use crate::traits::adapter::ServiceAdapter;
use crate::types::{CallHistoryEntry, CallType, RequestId, RequestStatus};

/// Body of a call-start write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCall {
    pub request_id: RequestId,
    pub call_type: CallType,
    pub start_time: DateTime<Utc>,
}

/// Body of a call-end write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndCall {
    pub request_id: RequestId,
    pub call_type: CallType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: u32,
}

/// Request-level side effect reported with an end acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUpdate {
    pub status: RequestStatus,
}

/// Acknowledgement of a call-end write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndAck {
    pub call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_updated: Option<RequestUpdate>,
}

/// The service of record for call segments.
#[async_trait]
pub trait SessionLogService: ServiceAdapter {
    async fn record_start(&self, start: &StartCall) -> Result<(), AlumnetError>;

    async fn record_end(&self, end: &EndCall) -> Result<EndAck, AlumnetError>;

    async fn by_requests(&self, ids: &[RequestId]) -> Result<Vec<CallHistoryEntry>, AlumnetError>;
}
