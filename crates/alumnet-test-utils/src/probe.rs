// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use alumnet_core::{CallRoomProbe, RequestId};
use async_trait::async_trait;

/// Replays a fixed sequence of open/closed answers, then repeats `then`.
pub struct ScriptedProbe {
    script: Mutex<VecDeque<bool>>,
    then: bool,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    /// Answers from `script`, closed once it runs out.
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            then: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_open() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            then: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallRoomProbe for ScriptedProbe {
    async fn is_open(&self, _request_id: &RequestId) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front().unwrap_or(self.then)
    }
}
