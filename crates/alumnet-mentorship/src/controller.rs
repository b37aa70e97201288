// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-(viewer, request) lifecycle controller.
//!
//! Request states move `pending -> {accepted, rejected}` and
//! `accepted -> completed`; `rejected` and `completed` are terminal. Calls
//! are only placed on accepted requests:
//!
//! - start call: payment re-check, timer start, ledger start, room announce
//! - end call: ledger end, merge, timer clear
//!
//! Each controller owns a [`StatusPoller`] and at most one call-window
//! watch. Both hold only a weak reference back, and both are cancelled by
//! [`LifecycleController::close`] or when the last clone is dropped.

use std::sync::{Arc, Weak};

use alumnet_core::traits::SessionStart;
use alumnet_core::{
    AlumnetError, CallHistoryEntry, CallRecord, CallType, GuardRejection, MentorshipRequest,
    PresenceStatus, RequestId, RequestStatus, UserId, Viewer, ViewerRole,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::MentorshipEngine;
use crate::guard::{CompletionAvailability, CompletionInputs};
use crate::merge::{MergeSources, merge};
use crate::poller::{PollOutcome, PollTarget, StatusPoller};
use crate::watch::WatchOutcome;

/// Where to join a call that was just started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLaunch {
    pub channel_name: String,
    pub attendee_link: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveCall {
    call_type: CallType,
    started_at: DateTime<Utc>,
}

struct ControllerState {
    view: MentorshipRequest,
    /// Local records the ledger has not confirmed yet.
    optimistic: Vec<CallRecord>,
    active_call: Option<ActiveCall>,
    presence: PresenceStatus,
    completion_asserted: bool,
    watch: Option<CancellationToken>,
}

struct Inner {
    engine: Arc<MentorshipEngine>,
    viewer: Viewer,
    request_id: RequestId,
    state: Mutex<ControllerState>,
    tick_guard: Mutex<()>,
    shutdown: CancellationToken,
    poller: Mutex<Option<StatusPoller>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Lifecycle operations on one request, as seen by one viewer.
///
/// Clones share state. Dropping the last clone cancels background work.
#[derive(Clone)]
pub struct LifecycleController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("request_id", &self.inner.request_id)
            .finish_non_exhaustive()
    }
}

impl LifecycleController {
    /// Load the request, restore a persisted timer and start polling.
    ///
    /// The request repository is asked first. When it cannot be reached the
    /// device fallback cache is used instead.
    pub async fn open(
        engine: Arc<MentorshipEngine>,
        user_id: &UserId,
        request_id: &RequestId,
        parent: &CancellationToken,
    ) -> Result<Self, AlumnetError> {
        let request = match engine.ledger.fetch_request(request_id).await {
            Ok(Some(request)) => request,
            Ok(None) => return Err(AlumnetError::NotFound(request_id.to_string())),
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    error = %e,
                    "request repository unreachable, opening from fallback cache"
                );
                engine.cache.load(request_id).await.ok_or(e)?
            }
        };

        let viewer = Viewer::of_request(&request, user_id).ok_or_else(|| {
            AlumnetError::NotFound(format!("{request_id} for user {user_id}"))
        })?;

        let active_call = if request.status == RequestStatus::Accepted {
            engine
                .timer
                .restore(request_id)
                .await
                .filter(|handle| !handle.adopted)
                .map(|handle| ActiveCall {
                    // The persisted timer does not carry the call type.
                    call_type: CallType::Video,
                    started_at: handle.started_at,
                })
        } else {
            engine.timer.clear(request_id).await;
            None
        };

        let inner = Arc::new(Inner {
            engine,
            viewer,
            request_id: request_id.clone(),
            state: Mutex::new(ControllerState {
                view: request.clone(),
                optimistic: Vec::new(),
                active_call,
                presence: PresenceStatus::default(),
                completion_asserted: false,
                watch: None,
            }),
            tick_guard: Mutex::new(()),
            shutdown: parent.child_token(),
            poller: Mutex::new(None),
        });
        let controller = Self { inner };

        let status = {
            let mut state = controller.inner.state.lock().await;
            controller.inner.reconcile(&mut state, Some(request)).await;
            state.view.status
        };

        if !status.is_terminal() {
            let poller = StatusPoller::spawn(
                Arc::downgrade(&controller.inner),
                controller.inner.engine.settings.poll_interval,
                &controller.inner.shutdown,
            );
            *controller.inner.poller.lock().await = Some(poller);
        }

        info!(
            request_id = %request_id,
            role = %controller.inner.viewer.role,
            %status,
            resumed_call = active_call.is_some(),
            "mentorship session opened"
        );
        Ok(controller)
    }

    pub fn request_id(&self) -> &RequestId {
        &self.inner.request_id
    }

    pub fn viewer(&self) -> &Viewer {
        &self.inner.viewer
    }

    /// Accept a pending request. Only the mentor may answer it.
    pub async fn accept(&self) -> Result<MentorshipRequest, AlumnetError> {
        self.ensure_mentor()?;
        let mut state = self.inner.state.lock().await;
        ensure_transition(state.view.status, RequestStatus::Accepted)?;

        self.inner
            .engine
            .ledger
            .set_status(&self.inner.request_id, RequestStatus::Accepted, None)
            .await?;
        state.view.status = RequestStatus::Accepted;
        self.inner.engine.cache.save(&state.view).await;

        info!(request_id = %self.inner.request_id, "mentorship request accepted");
        Ok(state.view.clone())
    }

    /// Reject with a free-text or preset reason. Blank reasons are refused.
    pub async fn reject(&self, reason: &str) -> Result<MentorshipRequest, AlumnetError> {
        self.ensure_mentor()?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(GuardRejection::EmptyReason.into());
        }

        let mut state = self.inner.state.lock().await;
        ensure_transition(state.view.status, RequestStatus::Rejected)?;

        self.inner
            .engine
            .ledger
            .set_status(
                &self.inner.request_id,
                RequestStatus::Rejected,
                Some(reason.to_string()),
            )
            .await?;
        state.view.status = RequestStatus::Rejected;
        state.view.rejection_reason = Some(reason.to_string());
        self.inner.engine.cache.save(&state.view).await;
        self.inner.stop_polling().await;

        info!(request_id = %self.inner.request_id, reason, "mentorship request rejected");
        Ok(state.view.clone())
    }

    /// Start a call segment. Payment is re-checked on every start.
    pub async fn start_call(&self, call_type: CallType) -> Result<CallLaunch, AlumnetError> {
        let engine = &self.inner.engine;
        let request_id = &self.inner.request_id;
        let mut state = self.inner.state.lock().await;

        if state.view.status != RequestStatus::Accepted {
            return Err(GuardRejection::NotAccepted {
                status: state.view.status,
            }
            .into());
        }
        if state.active_call.is_some() {
            return Err(GuardRejection::CallInProgress.into());
        }
        if !engine.gate.request_paid(&state.view).await {
            return Err(GuardRejection::Unpaid.into());
        }

        let handle = engine.timer.start(request_id).await;
        engine
            .ledger
            .record_start(request_id, call_type, handle.started_at)
            .await;

        let (channel_name, attendee_link) = engine.settings.call_room(request_id);
        let announce = SessionStart {
            request_id: request_id.clone(),
            participant_ids: vec![
                state.view.requester_id.clone(),
                state.view.counterpart_id.clone(),
            ],
            channel_name: channel_name.clone(),
            attendee_link: attendee_link.clone(),
        };
        if let Err(e) = engine.presence.session_start(&announce).await {
            warn!(request_id = %request_id, error = %e, "session start not announced");
        }

        state.active_call = Some(ActiveCall {
            call_type,
            started_at: handle.started_at,
        });
        state.watch = Some(self.spawn_watch());

        info!(request_id = %request_id, %call_type, channel = %channel_name, "call started");
        Ok(CallLaunch {
            channel_name,
            attendee_link,
            started_at: handle.started_at,
        })
    }

    /// End the running segment and return the merged view.
    pub async fn end_call(&self, call_type: CallType) -> Result<MentorshipRequest, AlumnetError> {
        let mut state = self.inner.state.lock().await;
        let Some(active) = state.active_call.take() else {
            return Err(GuardRejection::NoActiveCall.into());
        };
        self.inner
            .finish_call(&mut state, call_type, active.started_at)
            .await;
        Ok(state.view.clone())
    }

    /// Explicit end event from the call room. A no-op when no call runs.
    pub async fn notify_session_ended(&self) -> Option<MentorshipRequest> {
        let mut state = self.inner.state.lock().await;
        let Some(active) = state.active_call.take() else {
            debug!(request_id = %self.inner.request_id, "session end with no active call");
            return None;
        };
        self.inner
            .finish_call(&mut state, active.call_type, active.started_at)
            .await;
        Some(state.view.clone())
    }

    /// Manual completion, subject to the completion guard.
    pub async fn mark_completed(&self) -> Result<MentorshipRequest, AlumnetError> {
        let engine = &self.inner.engine;
        let request_id = &self.inner.request_id;
        let mut state = self.inner.state.lock().await;

        if state.view.status != RequestStatus::Accepted {
            return Err(GuardRejection::NotAccepted {
                status: state.view.status,
            }
            .into());
        }

        let presence = match engine.presence.status(request_id).await {
            Ok(presence) => {
                state.presence = presence.clone();
                presence
            }
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "presence unavailable, using last known");
                state.presence.clone()
            }
        };
        let inputs = CompletionInputs {
            status: state.view.status,
            elapsed_minutes: engine.timer.elapsed_minutes(request_id).await,
            counterpart_active: presence.counterpart_active(self.inner.viewer.role),
            has_paid: engine.gate.request_paid(&state.view).await,
        };
        let clearance = engine.guard.evaluate(request_id, &inputs)?;

        // The call and its timer stay untouched until the repository accepts
        // the completion, so a failed write can be retried.
        engine.ledger.mark_completed(&clearance).await?;
        state.completion_asserted = true;
        state.view.completed_manually = true;

        if let Some(active) = state.active_call.take() {
            self.inner
                .finish_call(&mut state, active.call_type, active.started_at)
                .await;
        }
        if state.view.status != RequestStatus::Completed {
            state.view.status = RequestStatus::Completed;
            engine.cache.save(&state.view).await;
        }
        engine.timer.clear(request_id).await;
        self.inner.stop_polling().await;

        Ok(state.view.clone())
    }

    /// What the "mark completed" action should look like right now.
    pub async fn completion_availability(&self) -> CompletionAvailability {
        let engine = &self.inner.engine;
        let state = self.inner.state.lock().await;
        let status = state.view.status;
        let has_paid = status == RequestStatus::Accepted && engine.gate.request_paid(&state.view).await;
        let inputs = CompletionInputs {
            status,
            elapsed_minutes: engine.timer.elapsed_minutes(&self.inner.request_id).await,
            counterpart_active: state.presence.counterpart_active(self.inner.viewer.role),
            has_paid,
        };
        engine.guard.availability(&self.inner.request_id, &inputs)
    }

    pub async fn merged_view(&self) -> MentorshipRequest {
        self.inner.state.lock().await.view.clone()
    }

    /// Last presence seen by the poller or by a completion attempt.
    pub async fn presence(&self) -> PresenceStatus {
        self.inner.state.lock().await.presence.clone()
    }

    pub async fn call_started_at(&self) -> Option<DateTime<Utc>> {
        self.inner
            .state
            .lock()
            .await
            .active_call
            .map(|call| call.started_at)
    }

    /// Re-read every source and merge again.
    pub async fn refresh(&self) -> MentorshipRequest {
        let base = match self
            .inner
            .engine
            .ledger
            .fetch_request(&self.inner.request_id)
            .await
        {
            Ok(request) => request,
            Err(e) => {
                warn!(request_id = %self.inner.request_id, error = %e, "request read failed during refresh");
                None
            }
        };
        let mut state = self.inner.state.lock().await;
        self.inner.reconcile(&mut state, base).await;
        state.view.clone()
    }

    /// Run one poll tick now. Skipped if a tick is already in flight.
    pub async fn poll_now(&self) -> PollOutcome {
        self.inner.poll_tick().await
    }

    pub async fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .await
            .as_ref()
            .is_some_and(|poller| !poller.is_finished())
    }

    /// Stop the poller and any call-window watch.
    pub async fn close(&self) {
        let poller = self.inner.poller.lock().await.take();
        if let Some(poller) = poller {
            poller.shutdown().await;
        }
        self.inner.shutdown.cancel();
        debug!(request_id = %self.inner.request_id, "mentorship session closed");
    }

    fn ensure_mentor(&self) -> Result<(), AlumnetError> {
        match self.inner.viewer.role {
            ViewerRole::Mentor => Ok(()),
            role => Err(GuardRejection::NotMentor { role }.into()),
        }
    }

    fn spawn_watch(&self) -> CancellationToken {
        let token = self.inner.shutdown.child_token();
        let task_token = token.clone();
        let owner: Weak<Inner> = Arc::downgrade(&self.inner);
        let watch = self.inner.engine.watch.clone();
        let request_id = self.inner.request_id.clone();

        tokio::spawn(async move {
            if watch.run(&request_id, task_token).await != WatchOutcome::Closed {
                return;
            }
            let Some(inner) = owner.upgrade() else {
                return;
            };
            LifecycleController { inner }.notify_session_ended().await;
        });

        token
    }
}

impl Inner {
    async fn finish_call(
        &self,
        state: &mut ControllerState,
        call_type: CallType,
        started_at: DateTime<Utc>,
    ) {
        if let Some(watch) = state.watch.take() {
            watch.cancel();
        }

        let outcome = self
            .engine
            .ledger
            .record_end(&self.request_id, call_type, started_at)
            .await;
        if outcome.request_status == Some(RequestStatus::Completed) {
            state.completion_asserted = true;
        }
        state.optimistic.push(outcome.record);

        self.reconcile(state, None).await;
        self.engine.timer.clear(&self.request_id).await;

        if state.view.status.is_terminal() {
            self.stop_polling().await;
        }
    }

    /// Merge ledger, fallback cache and local records into `state.view`
    /// and mirror the result to the cache. `base` replaces the request
    /// metadata when a fresh copy was read.
    async fn reconcile(&self, state: &mut ControllerState, base: Option<MentorshipRequest>) {
        let ledger = self.engine.ledger.history_of(&self.request_id).await;
        let fallback = self
            .engine
            .cache
            .load(&self.request_id)
            .await
            .map(|cached| CallHistoryEntry::from_request(&cached));

        let mut local = state.view.call_history.clone();
        local.extend(state.optimistic.iter().cloned());

        let base = base.unwrap_or_else(|| state.view.clone());
        let mut merged = merge(
            &base,
            &MergeSources {
                ledger: ledger.as_ref(),
                fallback: fallback.as_ref(),
                optimistic: &local,
                completion_asserted: state.completion_asserted
                    || state.view.status == RequestStatus::Completed,
                previous: Some(state.view.status),
            },
        );
        merged.completed_manually |= state.view.completed_manually;
        if merged.status == RequestStatus::Rejected && merged.rejection_reason.is_none() {
            merged.rejection_reason = state.view.rejection_reason.clone();
        }

        if let Some(ledger) = &ledger {
            state
                .optimistic
                .retain(|record| !ledger.history.iter().any(|l| l.call_id == record.call_id));
        }

        debug!(
            request_id = %self.request_id,
            calls = merged.call_history.len(),
            total_minutes = merged.total_call_duration,
            status = %merged.status,
            ledger_available = ledger.is_some(),
            "request view reconciled"
        );
        state.view = merged;
        self.engine.cache.save(&state.view).await;
    }

    async fn stop_polling(&self) {
        let poller = self.poller.lock().await.take();
        if let Some(poller) = poller {
            poller.cancel();
        }
    }
}

#[async_trait]
impl PollTarget for Inner {
    async fn poll_tick(&self) -> PollOutcome {
        let Ok(_tick) = self.tick_guard.try_lock() else {
            debug!(request_id = %self.request_id, "previous poll tick still running, skipping");
            return PollOutcome::Continue;
        };
        if self.shutdown.is_cancelled() {
            return PollOutcome::Stop;
        }
        if self.state.lock().await.view.status.is_terminal() {
            return PollOutcome::Stop;
        }

        match self.engine.presence.status(&self.request_id).await {
            Ok(presence) => {
                if presence.is_active {
                    if let Some(started_at) = presence.session_started_at {
                        self.engine.timer.adopt(&self.request_id, started_at).await;
                    }
                } else if self.state.lock().await.active_call.is_none() {
                    self.engine.timer.release_adopted(&self.request_id).await;
                }
                debug!(
                    request_id = %self.request_id,
                    counterpart_active = presence.counterpart_active(self.viewer.role),
                    "presence polled"
                );
                self.state.lock().await.presence = presence;
            }
            Err(e) => {
                debug!(request_id = %self.request_id, error = %e, "presence poll failed");
            }
        }
        PollOutcome::Continue
    }
}

fn ensure_transition(from: RequestStatus, to: RequestStatus) -> Result<(), AlumnetError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AlumnetError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_forward_transitions_are_allowed() {
        assert!(ensure_transition(RequestStatus::Pending, RequestStatus::Accepted).is_ok());
        assert!(ensure_transition(RequestStatus::Pending, RequestStatus::Rejected).is_ok());
        assert!(ensure_transition(RequestStatus::Accepted, RequestStatus::Completed).is_ok());

        let err = ensure_transition(RequestStatus::Rejected, RequestStatus::Accepted).unwrap_err();
        assert!(matches!(
            err,
            AlumnetError::InvalidTransition {
                from: RequestStatus::Rejected,
                to: RequestStatus::Accepted
            }
        ));
        assert!(ensure_transition(RequestStatus::Completed, RequestStatus::Accepted).is_err());
        assert!(ensure_transition(RequestStatus::Accepted, RequestStatus::Rejected).is_err());
    }
}
