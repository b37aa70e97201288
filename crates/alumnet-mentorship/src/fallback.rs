// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device-local shadow of the last merged view of each request.

use std::sync::Arc;

use alumnet_core::{FallbackStore, MentorshipRequest, RequestId};
use tracing::{debug, warn};

const REQUEST_KEY_PREFIX: &str = "mentorship_request:";

/// Non-authoritative copy of merged requests, read when the remote side is
/// silent and rewritten after every local mutation. Failures only log.
#[derive(Clone)]
pub struct FallbackCache {
    store: Arc<dyn FallbackStore>,
}

impl FallbackCache {
    pub fn new(store: Arc<dyn FallbackStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, request_id: &RequestId) -> Option<MentorshipRequest> {
        let value = match self.store.load(&cache_key(request_id)).await {
            Ok(value) => value?,
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "fallback cache read failed");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(request) => Some(request),
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "ignoring unreadable fallback cache entry");
                None
            }
        }
    }

    pub async fn save(&self, request: &MentorshipRequest) {
        let value = match serde_json::to_value(request) {
            Ok(value) => value,
            Err(e) => {
                warn!(request_id = %request.id, error = %e, "failed to encode fallback cache entry");
                return;
            }
        };
        match self.store.save(&cache_key(&request.id), &value).await {
            Ok(()) => debug!(
                request_id = %request.id,
                calls = request.call_history.len(),
                "fallback cache updated"
            ),
            Err(e) => warn!(request_id = %request.id, error = %e, "fallback cache write failed"),
        }
    }
}

fn cache_key(request_id: &RequestId) -> String {
    format!("{REQUEST_KEY_PREFIX}{request_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumnet_core::FallbackStore;
    use alumnet_test_utils::MemoryStore;

    #[tokio::test]
    async fn round_trips_a_request_snapshot() {
        let cache = FallbackCache::new(Arc::new(MemoryStore::new()));
        let request = MentorshipRequest::pending("r1".into(), "s1".into(), "m1".into());

        assert!(cache.load(&request.id).await.is_none());
        cache.save(&request).await;
        assert_eq!(cache.load(&request.id).await, Some(request));
    }

    #[tokio::test]
    async fn corrupt_entries_read_as_missing() {
        let store = Arc::new(MemoryStore::new());
        store
            .save("mentorship_request:r1", &serde_json::json!({ "id": 42 }))
            .await
            .unwrap();
        let cache = FallbackCache::new(store);
        assert!(cache.load(&"r1".into()).await.is_none());
    }

    #[tokio::test]
    async fn store_outage_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true).await;
        store.fail_reads(true).await;
        let cache = FallbackCache::new(store);

        cache
            .save(&MentorshipRequest::pending("r1".into(), "s1".into(), "m1".into()))
            .await;
        assert!(cache.load(&"r1".into()).await.is_none());
    }
}
