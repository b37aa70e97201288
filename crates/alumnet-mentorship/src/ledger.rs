// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call ledger: the remote record of call segments and request status.
//!
//! Session-log writes are at-least-once. A failed `end` write still yields a
//! completed record with a locally minted `local-` call id, which the merge
//! step keeps until the ledger catches up.

use std::sync::Arc;

use alumnet_core::traits::{EndCall, StartCall, StatusUpdate};
use alumnet_core::{
    AlumnetError, CallHistoryEntry, CallRecord, CallType, Clock, MentorshipRequest, RequestId,
    RequestRepository, RequestStatus, SessionLogService, call_duration_minutes,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::guard::CompletionClearance;

/// Prefix of call ids minted when the session log could not be reached.
pub const LOCAL_CALL_ID_PREFIX: &str = "local-";

/// Result of ending a call segment.
#[derive(Debug, Clone, PartialEq)]
pub struct EndOutcome {
    pub record: CallRecord,
    /// Status the session log reported for the request, if any.
    pub request_status: Option<RequestStatus>,
    /// Whether the session log acknowledged the write.
    pub acknowledged: bool,
}

/// Remote record of call segments and request status.
///
/// Segment starts are best effort. Segment ends always produce a record,
/// a `local-` one when the session log cannot be written.
pub struct CallLedger {
    session_log: Arc<dyn SessionLogService>,
    requests: Arc<dyn RequestRepository>,
    clock: Arc<dyn Clock>,
}

impl CallLedger {
    pub fn new(
        session_log: Arc<dyn SessionLogService>,
        requests: Arc<dyn RequestRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session_log,
            requests,
            clock,
        }
    }

    /// Append a call start. Returns whether the session log took it.
    pub async fn record_start(
        &self,
        request_id: &RequestId,
        call_type: CallType,
        start_time: DateTime<Utc>,
    ) -> bool {
        let start = StartCall {
            request_id: request_id.clone(),
            call_type,
            start_time,
        };
        match self.session_log.record_start(&start).await {
            Ok(()) => {
                info!(request_id = %request_id, %call_type, "call start recorded");
                true
            }
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "call start not recorded remotely");
                false
            }
        }
    }

    /// Close the segment that began at `start_time`, ending now.
    pub async fn record_end(
        &self,
        request_id: &RequestId,
        call_type: CallType,
        start_time: DateTime<Utc>,
    ) -> EndOutcome {
        let end_time = self.clock.now().max(start_time);
        let end = EndCall {
            request_id: request_id.clone(),
            call_type,
            start_time,
            end_time,
            duration: call_duration_minutes(start_time, end_time),
        };

        match self.session_log.record_end(&end).await {
            Ok(ack) => {
                let request_status = ack.request_updated.map(|u| u.status);
                info!(
                    request_id = %request_id,
                    call_id = %ack.call_id,
                    duration = end.duration,
                    status = ?request_status,
                    "call end recorded"
                );
                EndOutcome {
                    record: CallRecord::completed(ack.call_id, call_type, start_time, end_time),
                    request_status,
                    acknowledged: true,
                }
            }
            Err(e) => {
                let call_id = format!("{LOCAL_CALL_ID_PREFIX}{}", Uuid::new_v4());
                warn!(
                    request_id = %request_id,
                    call_id = %call_id,
                    error = %e,
                    "call end not recorded remotely, keeping local record"
                );
                EndOutcome {
                    record: CallRecord::completed(call_id, call_type, start_time, end_time),
                    request_status: None,
                    acknowledged: false,
                }
            }
        }
    }

    /// Batched history read. Errors propagate so callers can fall back.
    pub async fn history(
        &self,
        request_ids: &[RequestId],
    ) -> Result<Vec<CallHistoryEntry>, AlumnetError> {
        self.session_log.by_requests(request_ids).await
    }

    /// History of one request, `None` when the session log is unreachable.
    pub async fn history_of(&self, request_id: &RequestId) -> Option<CallHistoryEntry> {
        match self.history(std::slice::from_ref(request_id)).await {
            Ok(entries) => Some(
                entries
                    .into_iter()
                    .find(|e| &e.request_id == request_id)
                    .unwrap_or_else(|| CallHistoryEntry::empty(request_id.clone())),
            ),
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "call history read failed");
                None
            }
        }
    }

    pub async fn fetch_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<MentorshipRequest>, AlumnetError> {
        self.requests.get(request_id).await
    }

    /// Write a status change through to the request repository.
    pub async fn set_status(
        &self,
        request_id: &RequestId,
        status: RequestStatus,
        rejection_reason: Option<String>,
    ) -> Result<(), AlumnetError> {
        self.requests
            .update_status(
                request_id,
                &StatusUpdate {
                    status,
                    rejection_reason,
                    completed_manually: false,
                },
            )
            .await
    }

    /// Manual completion. Needs a clearance from the completion guard.
    pub async fn mark_completed(&self, clearance: &CompletionClearance) -> Result<(), AlumnetError> {
        self.requests
            .update_status(
                clearance.request_id(),
                &StatusUpdate {
                    status: RequestStatus::Completed,
                    rejection_reason: None,
                    completed_manually: true,
                },
            )
            .await?;
        info!(
            request_id = %clearance.request_id(),
            elapsed_minutes = clearance.elapsed_minutes(),
            "request marked completed"
        );
        Ok(())
    }
}
