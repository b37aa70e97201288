// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-interval background poller bound to a weakly held target.
//!
//! The task ends when its token is cancelled, when the target has been
//! dropped, or when a tick returns [`PollOutcome::Stop`]. Dropping the
//! [`StatusPoller`] cancels it, so a torn-down view never leaks a task.

use std::sync::Weak;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Whether the poller keeps going after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Continue,
    Stop,
}

/// Something the poller ticks. Held weakly so the poller never keeps it alive.
#[async_trait]
pub trait PollTarget: Send + Sync + 'static {
    async fn poll_tick(&self) -> PollOutcome;
}

/// Background presence polling for one controller.
///
/// Stops on cancellation or once the target is gone. A tick can also end
/// it by returning [`PollOutcome::Stop`].
pub struct StatusPoller {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Start polling `target` every `interval`. The first tick fires at once.
    pub fn spawn<T: PollTarget>(
        target: Weak<T>,
        interval: Duration,
        parent: &CancellationToken,
    ) -> Self {
        let token = parent.child_token();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // A slow tick delays the next one instead of bunching them up.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => {
                        debug!("status poller cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(target) = target.upgrade() else {
                            debug!("poll target dropped, stopping poller");
                            break;
                        };
                        let outcome = tokio::select! {
                            biased;
                            _ = task_token.cancelled() => PollOutcome::Stop,
                            outcome = target.poll_tick() => outcome,
                        };
                        drop(target);
                        if outcome == PollOutcome::Stop {
                            debug!("poll target asked to stop");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
