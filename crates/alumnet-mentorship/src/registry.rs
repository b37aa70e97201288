// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One controller per (viewer, request), torn down on release.

use std::collections::HashMap;
use std::sync::Arc;

use alumnet_core::{AlumnetError, RequestId, UserId};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::controller::LifecycleController;
use crate::engine::MentorshipEngine;

type SessionKey = (UserId, RequestId);

/// One live [`LifecycleController`] per (viewer, request).
pub struct SessionRegistry {
    engine: Arc<MentorshipEngine>,
    root: CancellationToken,
    sessions: Mutex<HashMap<SessionKey, LifecycleController>>,
}

impl SessionRegistry {
    /// Controllers opened here are cancelled together with `root`.
    pub fn new(engine: Arc<MentorshipEngine>, root: CancellationToken) -> Self {
        Self {
            engine,
            root,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The open controller for the pair, or a freshly opened one.
    pub async fn get_or_open(
        &self,
        user_id: &UserId,
        request_id: &RequestId,
    ) -> Result<LifecycleController, AlumnetError> {
        let mut sessions = self.sessions.lock().await;
        let key = (user_id.clone(), request_id.clone());
        if let Some(controller) = sessions.get(&key) {
            return Ok(controller.clone());
        }

        let controller = self.engine.open(user_id, request_id, &self.root).await?;
        sessions.insert(key, controller.clone());
        debug!(user_id = %user_id, request_id = %request_id, open = sessions.len(), "session registered");
        Ok(controller)
    }

    /// Close and forget a controller. Returns whether one was open.
    pub async fn release(&self, user_id: &UserId, request_id: &RequestId) -> bool {
        let removed = self
            .sessions
            .lock()
            .await
            .remove(&(user_id.clone(), request_id.clone()));
        match removed {
            Some(controller) => {
                controller.close().await;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn close_all(&self) {
        let drained: Vec<_> = self.sessions.lock().await.drain().map(|(_, c)| c).collect();
        for controller in drained {
            controller.close().await;
        }
        self.root.cancel();
    }
}
