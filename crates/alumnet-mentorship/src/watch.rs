// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timeout-bounded watch over the call room.
//!
//! This is the fallback end-of-call signal for when no explicit session-end
//! event arrives. The room counts as closed only after it was seen open.

use std::sync::Arc;
use std::time::Duration;

use alumnet_core::{CallRoomProbe, PresenceService, RequestId};
use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reads the room as open while the presence service reports activity.
/// An unreachable service keeps the room open until the hard bound.
pub struct PresenceRoomProbe {
    presence: Arc<dyn PresenceService>,
}

impl PresenceRoomProbe {
    pub fn new(presence: Arc<dyn PresenceService>) -> Self {
        Self { presence }
    }
}

#[async_trait]
impl CallRoomProbe for PresenceRoomProbe {
    async fn is_open(&self, request_id: &RequestId) -> bool {
        match self.presence.status(request_id).await {
            Ok(status) => status.is_active,
            Err(e) => {
                debug!(request_id = %request_id, error = %e, "room probe failed, assuming open");
                true
            }
        }
    }
}

/// How a watch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The room was seen open and then closed.
    Closed,
    /// The hard bound elapsed first.
    TimedOut,
    /// The owning controller went away.
    Cancelled,
}

/// Polls a [`CallRoomProbe`] until the room closes, bounded by
/// `max_duration`.
#[derive(Clone)]
pub struct CallWindowWatch {
    probe: Arc<dyn CallRoomProbe>,
    probe_interval: Duration,
    max_duration: Duration,
}

impl CallWindowWatch {
    pub fn new(probe: Arc<dyn CallRoomProbe>, probe_interval: Duration, max_duration: Duration) -> Self {
        Self {
            probe,
            probe_interval,
            max_duration,
        }
    }

    pub async fn run(&self, request_id: &RequestId, cancel: CancellationToken) -> WatchOutcome {
        let until_closed = async {
            let mut ticker = tokio::time::interval(self.probe_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut seen_open = false;
            loop {
                ticker.tick().await;
                let open = self.probe.is_open(request_id).await;
                if open {
                    seen_open = true;
                } else if seen_open {
                    return;
                }
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(request_id = %request_id, "call window watch cancelled");
                WatchOutcome::Cancelled
            }
            result = tokio::time::timeout(self.max_duration, until_closed) => match result {
                Ok(()) => {
                    info!(request_id = %request_id, "call room closed");
                    WatchOutcome::Closed
                }
                Err(_) => {
                    warn!(
                        request_id = %request_id,
                        max_secs = self.max_duration.as_secs(),
                        "call window watch hit its bound"
                    );
                    WatchOutcome::TimedOut
                }
            },
        }
    }
}
