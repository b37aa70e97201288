// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use alumnet_core::AlumnetError;
use tracing::debug;

use crate::migrations;

/// Convert a tokio-rusqlite error into `AlumnetError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> AlumnetError {
    AlumnetError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single-writer SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` with WAL enabled.
    pub async fn open(path: &str) -> Result<Self, AlumnetError> {
        Self::open_with(path, true).await
    }

    /// Open the database, applying PRAGMAs and pending migrations first.
    ///
    /// Schema preparation runs on a blocking thread with its own short-lived
    /// connection; the returned handle is the only writer afterwards.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, AlumnetError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| AlumnetError::Storage {
                source: Box::new(e),
            })?;
        }

        let owned = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), AlumnetError> {
            let mut conn = rusqlite::Connection::open(&owned).map_err(|e| AlumnetError::Storage {
                source: Box::new(e),
            })?;
            apply_pragmas(&conn, wal_mode).map_err(|e| AlumnetError::Storage {
                source: Box::new(e),
            })?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| AlumnetError::Internal(format!("schema setup task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| AlumnetError::Storage {
                source: Box::new(e),
            })?;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The single-writer connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), AlumnetError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL and release this handle.
    pub async fn close(self) -> Result<(), AlumnetError> {
        self.checkpoint().await?;
        drop(self.conn);
        Ok(())
    }
}

fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> Result<(), rusqlite::Error> {
    if wal_mode {
        // journal_mode returns a row, so it cannot go through execute_batch.
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        debug!(mode = %mode, "journal mode set");
    }
    conn.execute_batch("PRAGMA synchronous = NORMAL;")
}
