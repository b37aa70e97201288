// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared parts every lifecycle controller works through.

use std::sync::Arc;
use std::time::Duration;

use alumnet_config::model::AlumnetConfig;
use alumnet_core::{
    AlumnetError, CallRoomProbe, Clock, FallbackStore, PaymentService, PresenceService, RequestId,
    RequestRepository, SessionLogService, UserId,
};
use tokio_util::sync::CancellationToken;

use crate::controller::LifecycleController;
use crate::fallback::FallbackCache;
use crate::guard::CompletionGuard;
use crate::ledger::CallLedger;
use crate::payment::PaymentGate;
use crate::timer::SessionTimer;
use crate::watch::{CallWindowWatch, PresenceRoomProbe};

/// The collaborators the engine is wired against.
#[derive(Clone)]
pub struct Collaborators {
    pub session_log: Arc<dyn SessionLogService>,
    pub presence: Arc<dyn PresenceService>,
    pub payment: Arc<dyn PaymentService>,
    pub requests: Arc<dyn RequestRepository>,
    pub store: Arc<dyn FallbackStore>,
    pub clock: Arc<dyn Clock>,
}

/// Session rules taken from the `[session]` and `[poller]` sections.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub minimum_minutes: f64,
    pub poll_interval: Duration,
    pub watch_probe_interval: Duration,
    pub watch_max: Duration,
    pub call_room_base_url: String,
}

impl SessionSettings {
    pub fn from_config(config: &AlumnetConfig) -> Self {
        Self {
            minimum_minutes: config.session.minimum_minutes,
            poll_interval: config.poller.interval(),
            watch_probe_interval: config.session.watch_probe_interval(),
            watch_max: config.session.watch_max(),
            call_room_base_url: config.session.call_room_base_url.clone(),
        }
    }

    /// Channel name and attendee link of a request's call room.
    pub fn call_room(&self, request_id: &RequestId) -> (String, String) {
        let channel_name = format!("mentorship-{request_id}");
        let link = format!(
            "{}/{channel_name}",
            self.call_room_base_url.trim_end_matches('/')
        );
        (channel_name, link)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&AlumnetConfig::default())
    }
}

pub struct MentorshipEngine {
    pub(crate) ledger: CallLedger,
    pub(crate) timer: SessionTimer,
    pub(crate) cache: FallbackCache,
    pub(crate) gate: PaymentGate,
    pub(crate) presence: Arc<dyn PresenceService>,
    pub(crate) guard: CompletionGuard,
    pub(crate) watch: CallWindowWatch,
    pub(crate) settings: SessionSettings,
}

impl MentorshipEngine {
    /// Wire the engine. The call-window watch probes presence by default.
    pub fn new(collaborators: Collaborators, settings: SessionSettings) -> Self {
        let Collaborators {
            session_log,
            presence,
            payment,
            requests,
            store,
            clock,
        } = collaborators;

        let watch = CallWindowWatch::new(
            Arc::new(PresenceRoomProbe::new(presence.clone())),
            settings.watch_probe_interval,
            settings.watch_max,
        );

        Self {
            ledger: CallLedger::new(session_log, requests, clock.clone()),
            timer: SessionTimer::new(store.clone(), clock),
            cache: FallbackCache::new(store),
            gate: PaymentGate::new(payment),
            presence,
            guard: CompletionGuard::new(settings.minimum_minutes),
            watch,
            settings,
        }
    }

    /// Replace the probe behind the call-window watch.
    pub fn with_room_probe(mut self, probe: Arc<dyn CallRoomProbe>) -> Self {
        self.watch = CallWindowWatch::new(
            probe,
            self.settings.watch_probe_interval,
            self.settings.watch_max,
        );
        self
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn ledger(&self) -> &CallLedger {
        &self.ledger
    }

    /// Open a controller for `user_id` on `request_id`.
    pub async fn open(
        self: &Arc<Self>,
        user_id: &UserId,
        request_id: &RequestId,
        parent: &CancellationToken,
    ) -> Result<LifecycleController, AlumnetError> {
        LifecycleController::open(self.clone(), user_id, request_id, parent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config_defaults() {
        let settings = SessionSettings::default();
        assert_eq!(settings.minimum_minutes, 1.0);
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
        assert_eq!(settings.watch_max, Duration::from_secs(7200));
    }

    #[test]
    fn call_room_link_joins_base_and_channel() {
        let settings = SessionSettings {
            call_room_base_url: "https://meet.example/".into(),
            ..SessionSettings::default()
        };
        let (channel, link) = settings.call_room(&"r1".into());
        assert_eq!(channel, "mentorship-r1");
        assert_eq!(link, "https://meet.example/mentorship-r1");
    }
}
