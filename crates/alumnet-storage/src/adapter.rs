// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the durable fallback store.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use alumnet_config::model::StorageConfig;
use alumnet_core::{AlumnetError, FallbackStore, HealthStatus, ServiceAdapter, ServiceKind};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed key/value store.
///
/// The database is lazily opened on the first call to
/// [`SqliteFallbackStore::initialize`].
pub struct SqliteFallbackStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteFallbackStore {
    /// Create a store for the configured path. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and run migrations. Fails if called twice.
    pub async fn initialize(&self) -> Result<(), AlumnetError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| AlumnetError::Storage {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "fallback store initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, AlumnetError> {
        self.db.get().ok_or_else(|| AlumnetError::Storage {
            source: "store not initialized -- call initialize() first".into(),
        })
    }

    /// Keys currently held under `prefix`.
    pub async fn keys(&self, prefix: &str) -> Result<Vec<String>, AlumnetError> {
        queries::kv::keys_with_prefix(self.db()?, prefix).await
    }

    /// Checkpoint the WAL before the process exits.
    pub async fn flush(&self) -> Result<(), AlumnetError> {
        match self.db.get() {
            Some(db) => db.checkpoint().await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ServiceAdapter for SqliteFallbackStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn service_kind(&self) -> ServiceKind {
        ServiceKind::FallbackStore
    }

    async fn health_check(&self) -> Result<HealthStatus, AlumnetError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl FallbackStore for SqliteFallbackStore {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, AlumnetError> {
        let Some(text) = queries::kv::get(self.db()?, key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| AlumnetError::Storage {
                source: Box::new(e),
            })
    }

    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), AlumnetError> {
        let text = serde_json::to_string(value).map_err(|e| AlumnetError::Storage {
            source: Box::new(e),
        })?;
        queries::kv::put(self.db()?, key, &text).await
    }

    async fn remove(&self, key: &str) -> Result<(), AlumnetError> {
        queries::kv::delete(self.db()?, key).await.map(|_| ())
    }
}
