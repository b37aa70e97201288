// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end lifecycle tests.
//!
//! `TestHarness` wires a [`MentorshipEngine`] over the mock collaborators,
//! a manual clock and either an in-memory or a temp SQLite store.

use std::sync::Arc;

use alumnet_config::model::StorageConfig;
use alumnet_core::{
    AlumnetError, CallRoomProbe, FallbackStore, MentorshipRequest, RequestId, RequestStatus, UserId,
};
use alumnet_mentorship::{
    Collaborators, LifecycleController, MentorshipEngine, SessionRegistry,
    SessionSettings,
};
use alumnet_storage::SqliteFallbackStore;
use tokio_util::sync::CancellationToken;

use crate::clock::ManualClock;
use crate::memory_store::MemoryStore;
use crate::mock_services::{MockPayment, MockPresence, MockRequests, MockSessionLog};
use crate::probe::ScriptedProbe;

/// Request `r1` from student `s1` to mentor `m1`, already accepted.
pub fn accepted_request() -> MentorshipRequest {
    let mut request = MentorshipRequest::pending("r1".into(), "s1".into(), "m1".into());
    request.status = RequestStatus::Accepted;
    request
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    requests: Vec<MentorshipRequest>,
    paid: Vec<RequestId>,
    settings: SessionSettings,
    probe: Option<Arc<dyn CallRoomProbe>>,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            requests: Vec::new(),
            paid: Vec::new(),
            settings: SessionSettings::default(),
            probe: None,
            sqlite: false,
        }
    }

    pub fn with_request(mut self, request: MentorshipRequest) -> Self {
        self.requests.push(request);
        self
    }

    pub fn paid(mut self, request_id: &str) -> Self {
        self.paid.push(request_id.into());
        self
    }

    pub fn with_minimum_minutes(mut self, minutes: f64) -> Self {
        self.settings.minimum_minutes = minutes;
        self
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use a scripted call-room probe instead of presence.
    pub fn with_probe(mut self, probe: Arc<ScriptedProbe>) -> Self {
        self.probe = Some(probe as Arc<dyn CallRoomProbe>);
        self
    }

    /// Back the engine with a temp SQLite database.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, AlumnetError> {
        let session_log = Arc::new(MockSessionLog::new());
        let presence = Arc::new(MockPresence::new());
        let payment = Arc::new(MockPayment::new());
        let requests = Arc::new(MockRequests::new());
        let clock = Arc::new(ManualClock::default());

        for request in self.requests {
            requests.insert(request).await;
        }
        for id in &self.paid {
            payment.mark_paid(id.as_str()).await;
        }

        let mut temp_dir = None;
        let store: Arc<dyn FallbackStore> = if self.sqlite {
            let dir =
                tempfile::TempDir::new().map_err(|e| AlumnetError::Storage { source: e.into() })?;
            let sqlite = SqliteFallbackStore::new(StorageConfig {
                database_path: dir.path().join("test.db").to_string_lossy().to_string(),
                wal_mode: true,
            });
            sqlite.initialize().await?;
            temp_dir = Some(dir);
            Arc::new(sqlite)
        } else {
            Arc::new(MemoryStore::new())
        };

        let collaborators = Collaborators {
            session_log: session_log.clone(),
            presence: presence.clone(),
            payment: payment.clone(),
            requests: requests.clone(),
            store,
            clock: clock.clone(),
        };

        let engine = wire(&collaborators, &self.settings, self.probe.as_ref());
        Ok(TestHarness {
            session_log,
            presence,
            payment,
            requests,
            clock,
            root: CancellationToken::new(),
            collaborators,
            settings: self.settings,
            probe: self.probe,
            engine,
            _temp_dir: temp_dir,
        })
    }
}

/// A wired engine with handles on every mock for assertions.
pub struct TestHarness {
    pub session_log: Arc<MockSessionLog>,
    pub presence: Arc<MockPresence>,
    pub payment: Arc<MockPayment>,
    pub requests: Arc<MockRequests>,
    pub clock: Arc<ManualClock>,
    pub root: CancellationToken,
    collaborators: Collaborators,
    settings: SessionSettings,
    probe: Option<Arc<dyn CallRoomProbe>>,
    engine: Arc<MentorshipEngine>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn engine(&self) -> Arc<MentorshipEngine> {
        self.engine.clone()
    }

    pub fn store(&self) -> Arc<dyn FallbackStore> {
        self.collaborators.store.clone()
    }

    /// A fresh engine over the same collaborators and store, as after a
    /// process restart.
    pub fn restart(&mut self) {
        self.root.cancel();
        self.root = CancellationToken::new();
        self.engine = wire(&self.collaborators, &self.settings, self.probe.as_ref());
    }

    pub async fn open(&self, user_id: &str, request_id: &str) -> Result<LifecycleController, AlumnetError> {
        self.engine()
            .open(&UserId::from(user_id), &RequestId::from(request_id), &self.root)
            .await
    }

    pub fn registry(&self) -> SessionRegistry {
        SessionRegistry::new(self.engine(), self.root.child_token())
    }
}

fn wire(
    collaborators: &Collaborators,
    settings: &SessionSettings,
    probe: Option<&Arc<dyn CallRoomProbe>>,
) -> Arc<MentorshipEngine> {
    let engine = MentorshipEngine::new(collaborators.clone(), settings.clone());
    Arc::new(match probe {
        Some(probe) => engine.with_room_probe(probe.clone()),
        None => engine,
    })
}
