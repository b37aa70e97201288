// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-segment timer with durable start times.
//!
//! The start of the running segment is held in memory and mirrored to the
//! [`FallbackStore`] so a restarted process resumes the same elapsed curve.
//! Store failures are logged and never fail the caller.
//!
//! A segment is either local (started by this process) or adopted from a
//! start the presence service reported. Adopted segments follow the remote
//! room: a newer remote start replaces them and [`SessionTimer::release_adopted`]
//! drops them once the room is empty. Local segments are only ended by
//! [`SessionTimer::clear`].

use std::collections::HashMap;
use std::sync::Arc;

use alumnet_core::{Clock, FallbackStore, RequestId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const TIMER_KEY_PREFIX: &str = "session_timer:";

/// A running segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub started_at: DateTime<Utc>,
    /// Taken over from the presence service rather than started here.
    pub adopted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTimer {
    started_at: DateTime<Utc>,
    #[serde(default)]
    adopted: bool,
}

/// Whole minutes still missing before `minimum_minutes` is reached.
pub fn remaining_minutes(minimum_minutes: f64, elapsed_minutes: f64) -> u32 {
    let missing = (minimum_minutes - elapsed_minutes).ceil();
    if missing.is_nan() || missing <= 0.0 {
        0
    } else {
        missing as u32
    }
}

/// Tracks the running call segment of each request.
///
/// Elapsed time is measured against the injected [`Clock`], so tests drive
/// it with a manual clock.
pub struct SessionTimer {
    store: Arc<dyn FallbackStore>,
    clock: Arc<dyn Clock>,
    running: Mutex<HashMap<RequestId, TimerHandle>>,
}

impl SessionTimer {
    pub fn new(store: Arc<dyn FallbackStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Start a segment now, replacing any previous one for the request.
    pub async fn start(&self, request_id: &RequestId) -> TimerHandle {
        let handle = TimerHandle {
            started_at: self.clock.now(),
            adopted: false,
        };
        let mut running = self.running.lock().await;
        running.insert(request_id.clone(), handle);
        self.persist(request_id, handle).await;
        info!(request_id = %request_id, started_at = %handle.started_at, "session timer started");
        handle
    }

    /// Minutes since the running segment started, 0 when none is running.
    pub async fn elapsed_minutes(&self, request_id: &RequestId) -> f64 {
        let running = self.running.lock().await;
        match running.get(request_id) {
            Some(handle) => {
                let millis = (self.clock.now() - handle.started_at).num_milliseconds().max(0);
                millis as f64 / 60_000.0
            }
            None => 0.0,
        }
    }

    pub async fn remaining(&self, request_id: &RequestId, minimum_minutes: f64) -> u32 {
        remaining_minutes(minimum_minutes, self.elapsed_minutes(request_id).await)
    }

    pub async fn handle(&self, request_id: &RequestId) -> Option<TimerHandle> {
        self.running.lock().await.get(request_id).copied()
    }

    pub async fn is_running(&self, request_id: &RequestId) -> bool {
        self.running.lock().await.contains_key(request_id)
    }

    /// Reload the persisted start. Calling it again returns the same handle.
    pub async fn restore(&self, request_id: &RequestId) -> Option<TimerHandle> {
        let mut running = self.running.lock().await;
        if let Some(handle) = running.get(request_id) {
            return Some(*handle);
        }

        let handle = self.load(request_id).await?;
        running.insert(request_id.clone(), handle);
        debug!(
            request_id = %request_id,
            started_at = %handle.started_at,
            adopted = handle.adopted,
            "session timer restored"
        );
        Some(handle)
    }

    /// Take over a start reported by the presence service.
    ///
    /// A local start (in memory or persisted) wins over the remote one. An
    /// earlier adopted start is replaced when the remote start moves on.
    pub async fn adopt(&self, request_id: &RequestId, started_at: DateTime<Utc>) -> TimerHandle {
        if let Some(existing) = self.restore(request_id).await
            && (!existing.adopted || existing.started_at == started_at)
        {
            return existing;
        }
        let handle = TimerHandle {
            started_at,
            adopted: true,
        };
        let mut running = self.running.lock().await;
        running.insert(request_id.clone(), handle);
        self.persist(request_id, handle).await;
        info!(request_id = %request_id, %started_at, "adopted remote session start");
        handle
    }

    /// Drop an adopted segment. Local segments are left running.
    ///
    /// Returns whether a segment was dropped.
    pub async fn release_adopted(&self, request_id: &RequestId) -> bool {
        match self.restore(request_id).await {
            Some(handle) if handle.adopted => {
                self.clear(request_id).await;
                info!(request_id = %request_id, "remote session ended, adopted timer released");
                true
            }
            _ => false,
        }
    }

    /// Forget the segment. Clearing an idle timer is a no-op.
    pub async fn clear(&self, request_id: &RequestId) {
        let mut running = self.running.lock().await;
        running.remove(request_id);
        if let Err(e) = self.store.remove(&timer_key(request_id)).await {
            warn!(request_id = %request_id, error = %e, "failed to clear persisted session timer");
        }
    }

    async fn persist(&self, request_id: &RequestId, handle: TimerHandle) {
        let persisted = PersistedTimer {
            started_at: handle.started_at,
            adopted: handle.adopted,
        };
        let value = match serde_json::to_value(persisted) {
            Ok(value) => value,
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "failed to encode session timer");
                return;
            }
        };
        if let Err(e) = self.store.save(&timer_key(request_id), &value).await {
            warn!(request_id = %request_id, error = %e, "failed to persist session timer");
        }
    }

    async fn load(&self, request_id: &RequestId) -> Option<TimerHandle> {
        let value = match self.store.load(&timer_key(request_id)).await {
            Ok(value) => value?,
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "failed to read persisted session timer");
                return None;
            }
        };
        match serde_json::from_value::<PersistedTimer>(value) {
            Ok(persisted) => Some(TimerHandle {
                started_at: persisted.started_at,
                adopted: persisted.adopted,
            }),
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "discarding unreadable session timer");
                None
            }
        }
    }
}

fn timer_key(request_id: &RequestId) -> String {
    format!("{TIMER_KEY_PREFIX}{request_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumnet_test_utils::{ManualClock, MemoryStore};
    use chrono::Duration;

    fn timer_with(store: Arc<MemoryStore>, clock: Arc<ManualClock>) -> SessionTimer {
        SessionTimer::new(store, clock)
    }

    #[test]
    fn remaining_rounds_up_and_never_goes_negative() {
        assert_eq!(remaining_minutes(1.0, 40.0 / 60.0), 1);
        assert_eq!(remaining_minutes(1.0, 1.0), 0);
        assert_eq!(remaining_minutes(1.0, 3.5), 0);
        assert_eq!(remaining_minutes(5.0, 0.0), 5);
        assert_eq!(remaining_minutes(2.5, 0.25), 3);
    }

    #[tokio::test]
    async fn forty_seconds_of_one_minute_leaves_one_minute() {
        let clock = Arc::new(ManualClock::default());
        let timer = timer_with(Arc::new(MemoryStore::new()), clock.clone());
        let id = RequestId::from("r1");

        timer.start(&id).await;
        clock.advance(Duration::seconds(40));

        let elapsed = timer.elapsed_minutes(&id).await;
        assert!((elapsed - 40.0 / 60.0).abs() < 1e-9);
        assert_eq!(timer.remaining(&id, 1.0).await, 1);
    }

    #[tokio::test]
    async fn idle_timer_reports_zero_elapsed() {
        let timer = timer_with(Arc::new(MemoryStore::new()), Arc::new(ManualClock::default()));
        assert_eq!(timer.elapsed_minutes(&"r1".into()).await, 0.0);
        assert_eq!(timer.remaining(&"r1".into(), 1.0).await, 1);
    }

    #[tokio::test]
    async fn restore_resumes_after_restart_and_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let id = RequestId::from("r1");

        let original = timer_with(store.clone(), clock.clone()).start(&id).await;
        clock.advance(Duration::seconds(30));

        let restarted = timer_with(store, clock.clone());
        let first = restarted.restore(&id).await.unwrap();
        let elapsed_first = restarted.elapsed_minutes(&id).await;
        let second = restarted.restore(&id).await.unwrap();
        let elapsed_second = restarted.elapsed_minutes(&id).await;

        assert_eq!(first, original);
        assert_eq!(second, original);
        assert_eq!(elapsed_first, elapsed_second);
        assert!((elapsed_first - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn clear_is_idempotent_and_removes_persisted_state() {
        let store = Arc::new(MemoryStore::new());
        let timer = timer_with(store.clone(), Arc::new(ManualClock::default()));
        let id = RequestId::from("r1");

        timer.start(&id).await;
        assert!(store.contains("session_timer:r1").await);

        timer.clear(&id).await;
        timer.clear(&id).await;
        assert!(!timer.is_running(&id).await);
        assert!(!store.contains("session_timer:r1").await);
        assert!(timer.restore(&id).await.is_none());
    }

    #[tokio::test]
    async fn adopt_prefers_local_start_over_remote() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let timer = timer_with(store.clone(), clock.clone());
        let id = RequestId::from("r1");

        let local = timer.start(&id).await;
        let remote = local.started_at - Duration::minutes(3);
        assert_eq!(timer.adopt(&id, remote).await, local);

        let other = RequestId::from("r2");
        let adopted = timer.adopt(&other, remote).await;
        assert_eq!(adopted.started_at, remote);
        assert!(adopted.adopted);
        assert!(store.contains("session_timer:r2").await);
    }

    #[tokio::test]
    async fn newer_remote_start_replaces_an_adopted_one() {
        let clock = Arc::new(ManualClock::default());
        let timer = timer_with(Arc::new(MemoryStore::new()), clock.clone());
        let id = RequestId::from("r1");

        let first = clock.now() - Duration::minutes(10);
        let second = clock.now() - Duration::seconds(30);
        timer.adopt(&id, first).await;
        assert_eq!(timer.adopt(&id, first).await.started_at, first);

        let replaced = timer.adopt(&id, second).await;
        assert_eq!(replaced.started_at, second);
        assert!((timer.elapsed_minutes(&id).await - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn release_only_drops_adopted_segments() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let timer = timer_with(store.clone(), clock.clone());

        let local = RequestId::from("r1");
        timer.start(&local).await;
        assert!(!timer.release_adopted(&local).await);
        assert!(timer.is_running(&local).await);

        let remote = RequestId::from("r2");
        timer.adopt(&remote, clock.now()).await;
        assert!(timer.release_adopted(&remote).await);
        assert!(!timer.is_running(&remote).await);
        assert!(!store.contains("session_timer:r2").await);
        assert!(!timer.release_adopted(&remote).await);
    }

    #[tokio::test]
    async fn adopted_flag_survives_a_restart() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let id = RequestId::from("r1");

        timer_with(store.clone(), clock.clone())
            .adopt(&id, clock.now())
            .await;

        let restarted = timer_with(store, clock);
        assert!(restarted.restore(&id).await.unwrap().adopted);
        assert!(restarted.release_adopted(&id).await);
    }

    #[tokio::test]
    async fn store_failures_do_not_stop_the_timer() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true).await;
        let timer = timer_with(store, Arc::new(ManualClock::default()));

        timer.start(&"r1".into()).await;
        assert!(timer.is_running(&"r1".into()).await);
    }
}
