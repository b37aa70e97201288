// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

use alumnet_core::{AlumnetError, FallbackStore};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// In-memory [`FallbackStore`] with switches to simulate a broken disk.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, serde_json::Value>>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().await = fail;
    }

    pub async fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().await = fail;
    }
}

fn disk_error() -> AlumnetError {
    AlumnetError::Storage {
        source: Box::new(std::io::Error::other("simulated store failure")),
    }
}

#[async_trait]
impl FallbackStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, AlumnetError> {
        if *self.fail_reads.lock().await {
            return Err(disk_error());
        }
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), AlumnetError> {
        if *self.fail_writes.lock().await {
            return Err(disk_error());
        }
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AlumnetError> {
        if *self.fail_writes.lock().await {
            return Err(disk_error());
        }
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
