// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory remote collaborators.
//!
//! Each mock records what it was asked and can be switched into a failing
//! mode to exercise the degraded paths.

use std::collections::{HashMap, HashSet};

use alumnet_core::traits::{
    EndAck, EndCall, RequestUpdate, SessionStart, StartCall, StatusUpdate,
};
use alumnet_core::{
    AlumnetError, CallHistoryEntry, CallRecord, HealthStatus, MentorshipRequest, PaymentService,
    PresenceService, PresenceStatus, RequestId, RequestRepository, RequestStatus, ServiceAdapter,
    ServiceKind, SessionLogService, UserId,
};
use async_trait::async_trait;
use tokio::sync::Mutex;

fn unreachable(service: ServiceKind) -> AlumnetError {
    AlumnetError::remote(service, "simulated network failure")
}

macro_rules! mock_adapter {
    ($ty:ty, $name:literal, $kind:expr) => {
        #[async_trait]
        impl ServiceAdapter for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn service_kind(&self) -> ServiceKind {
                $kind
            }

            async fn health_check(&self) -> Result<HealthStatus, AlumnetError> {
                Ok(HealthStatus::Healthy)
            }
        }
    };
}

/// Session log that keeps history like the real ledger would.
#[derive(Default)]
pub struct MockSessionLog {
    started: Mutex<Vec<StartCall>>,
    ended: Mutex<Vec<EndCall>>,
    entries: Mutex<HashMap<RequestId, CallHistoryEntry>>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
    complete_on_end: Mutex<bool>,
}

impl MockSessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the history returned for a request.
    pub async fn set_entry(&self, entry: CallHistoryEntry) {
        self.entries
            .lock()
            .await
            .insert(entry.request_id.clone(), entry);
    }

    pub async fn started(&self) -> Vec<StartCall> {
        self.started.lock().await.clone()
    }

    pub async fn ended(&self) -> Vec<EndCall> {
        self.ended.lock().await.clone()
    }

    pub async fn fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().await = fail;
    }

    pub async fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().await = fail;
    }

    /// Flip the request to completed on every acknowledged end.
    pub async fn complete_on_end(&self, complete: bool) {
        *self.complete_on_end.lock().await = complete;
    }
}

mock_adapter!(MockSessionLog, "mock-session-log", ServiceKind::SessionLog);

#[async_trait]
impl SessionLogService for MockSessionLog {
    async fn record_start(&self, start: &StartCall) -> Result<(), AlumnetError> {
        if *self.fail_writes.lock().await {
            return Err(unreachable(ServiceKind::SessionLog));
        }
        self.started.lock().await.push(start.clone());
        Ok(())
    }

    async fn record_end(&self, end: &EndCall) -> Result<EndAck, AlumnetError> {
        if *self.fail_writes.lock().await {
            return Err(unreachable(ServiceKind::SessionLog));
        }
        let mut ended = self.ended.lock().await;
        ended.push(end.clone());
        let call_id = format!("call-{}", ended.len());

        let complete = *self.complete_on_end.lock().await;
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry(end.request_id.clone())
            .or_insert_with(|| CallHistoryEntry::empty(end.request_id.clone()));
        let record = CallRecord::completed(call_id.clone(), end.call_type, end.start_time, end.end_time);
        entry.total_call_duration += record.counted_minutes();
        entry.last_call_completed_at = Some(end.end_time);
        entry.history.push(record);
        entry.completed |= complete;

        Ok(EndAck {
            call_id,
            request_updated: complete.then_some(RequestUpdate {
                status: RequestStatus::Completed,
            }),
        })
    }

    async fn by_requests(&self, ids: &[RequestId]) -> Result<Vec<CallHistoryEntry>, AlumnetError> {
        if *self.fail_reads.lock().await {
            return Err(unreachable(ServiceKind::SessionLog));
        }
        let entries = self.entries.lock().await;
        Ok(ids.iter().filter_map(|id| entries.get(id).cloned()).collect())
    }
}

/// Presence service with per-request status.
#[derive(Default)]
pub struct MockPresence {
    statuses: Mutex<HashMap<RequestId, PresenceStatus>>,
    announced: Mutex<Vec<SessionStart>>,
    fail: Mutex<bool>,
    polls: Mutex<usize>,
}

impl MockPresence {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_status(&self, request_id: &str, status: PresenceStatus) {
        self.statuses
            .lock()
            .await
            .insert(RequestId::from(request_id), status);
    }

    pub async fn fail(&self, fail: bool) {
        *self.fail.lock().await = fail;
    }

    pub async fn announced(&self) -> Vec<SessionStart> {
        self.announced.lock().await.clone()
    }

    pub async fn polls(&self) -> usize {
        *self.polls.lock().await
    }
}

mock_adapter!(MockPresence, "mock-presence", ServiceKind::Presence);

#[async_trait]
impl PresenceService for MockPresence {
    async fn status(&self, request_id: &RequestId) -> Result<PresenceStatus, AlumnetError> {
        *self.polls.lock().await += 1;
        if *self.fail.lock().await {
            return Err(unreachable(ServiceKind::Presence));
        }
        Ok(self
            .statuses
            .lock()
            .await
            .get(request_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn session_start(&self, start: &SessionStart) -> Result<(), AlumnetError> {
        if *self.fail.lock().await {
            return Err(unreachable(ServiceKind::Presence));
        }
        self.announced.lock().await.push(start.clone());
        Ok(())
    }
}

/// Payment lookup keyed by request id.
#[derive(Default)]
pub struct MockPayment {
    paid: Mutex<HashSet<RequestId>>,
    failure: Mutex<Option<String>>,
    checks: Mutex<usize>,
}

impl MockPayment {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mark_paid(&self, request_id: &str) {
        self.set_paid(request_id, true).await;
    }

    pub async fn set_paid(&self, request_id: &str, paid: bool) {
        let mut set = self.paid.lock().await;
        if paid {
            set.insert(RequestId::from(request_id));
        } else {
            set.remove(&RequestId::from(request_id));
        }
    }

    pub async fn fail_with(&self, message: &str) {
        *self.failure.lock().await = Some(message.to_string());
    }

    pub async fn recover(&self) {
        *self.failure.lock().await = None;
    }

    pub async fn checks(&self) -> usize {
        *self.checks.lock().await
    }
}

mock_adapter!(MockPayment, "mock-payment", ServiceKind::Payment);

#[async_trait]
impl PaymentService for MockPayment {
    async fn has_paid(
        &self,
        _payer: &UserId,
        _payee: &UserId,
        request_id: &RequestId,
    ) -> Result<bool, AlumnetError> {
        *self.checks.lock().await += 1;
        if let Some(message) = self.failure.lock().await.clone() {
            return Err(AlumnetError::remote(ServiceKind::Payment, message));
        }
        Ok(self.paid.lock().await.contains(request_id))
    }
}

/// Request repository applying status updates in place.
#[derive(Default)]
pub struct MockRequests {
    requests: Mutex<HashMap<RequestId, MentorshipRequest>>,
    updates: Mutex<Vec<(RequestId, StatusUpdate)>>,
    fail: Mutex<bool>,
}

impl MockRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, request: MentorshipRequest) {
        self.requests
            .lock()
            .await
            .insert(request.id.clone(), request);
    }

    pub async fn get_stored(&self, id: &RequestId) -> Option<MentorshipRequest> {
        self.requests.lock().await.get(id).cloned()
    }

    pub async fn updates(&self) -> Vec<(RequestId, StatusUpdate)> {
        self.updates.lock().await.clone()
    }

    pub async fn fail(&self, fail: bool) {
        *self.fail.lock().await = fail;
    }
}

mock_adapter!(MockRequests, "mock-requests", ServiceKind::Requests);

#[async_trait]
impl RequestRepository for MockRequests {
    async fn get(&self, id: &RequestId) -> Result<Option<MentorshipRequest>, AlumnetError> {
        if *self.fail.lock().await {
            return Err(unreachable(ServiceKind::Requests));
        }
        Ok(self.requests.lock().await.get(id).cloned())
    }

    async fn update_status(&self, id: &RequestId, update: &StatusUpdate) -> Result<(), AlumnetError> {
        if *self.fail.lock().await {
            return Err(unreachable(ServiceKind::Requests));
        }
        let mut requests = self.requests.lock().await;
        let request = requests
            .get_mut(id)
            .ok_or_else(|| AlumnetError::NotFound(id.to_string()))?;
        request.status = update.status;
        if update.rejection_reason.is_some() {
            request.rejection_reason = update.rejection_reason.clone();
        }
        request.completed_manually |= update.completed_manually;
        self.updates.lock().await.push((id.clone(), update.clone()));
        Ok(())
    }
}
