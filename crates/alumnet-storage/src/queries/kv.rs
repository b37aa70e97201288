// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key/value CRUD on the `kv_store` table. Values are JSON text.

use alumnet_core::AlumnetError;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};

/// Fetch the JSON text stored under `key`.
pub async fn get(db: &Database, key: &str) -> Result<Option<String>, AlumnetError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace the value under `key`.
pub async fn put(db: &Database, key: &str, value: &str) -> Result<(), AlumnetError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![key, value],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete `key`. Returns whether a row was removed.
pub async fn delete(db: &Database, key: &str) -> Result<bool, AlumnetError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let removed = conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Keys starting with `prefix`, oldest write first.
pub async fn keys_with_prefix(db: &Database, prefix: &str) -> Result<Vec<String>, AlumnetError> {
    let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
    db.connection()
        .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT key FROM kv_store WHERE key LIKE ?1 ESCAPE '\\' ORDER BY updated_at, key",
            )?;
            let keys = stmt
                .query_map(params![pattern], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(keys)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("kv.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn put_then_get_returns_value() {
        let (db, _dir) = setup_db().await;
        put(&db, "timer:r1", r#"{"startedAt":"2026-03-01T10:00:00Z"}"#)
            .await
            .unwrap();
        let value = get(&db, "timer:r1").await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"{"startedAt":"2026-03-01T10:00:00Z"}"#));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn put_overwrites_existing_key() {
        let (db, _dir) = setup_db().await;
        put(&db, "k", "1").await.unwrap();
        put(&db, "k", "2").await.unwrap();
        assert_eq!(get(&db, "k").await.unwrap().as_deref(), Some("2"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let (db, _dir) = setup_db().await;
        assert!(get(&db, "nope").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (db, _dir) = setup_db().await;
        put(&db, "k", "1").await.unwrap();
        assert!(delete(&db, "k").await.unwrap());
        assert!(!delete(&db, "k").await.unwrap());
        assert!(get(&db, "k").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn prefix_listing_treats_underscore_literally() {
        let (db, _dir) = setup_db().await;
        put(&db, "call_history:r1", "{}").await.unwrap();
        put(&db, "callXhistory:r2", "{}").await.unwrap();
        put(&db, "timer:r1", "{}").await.unwrap();
        let keys = keys_with_prefix(&db, "call_history:").await.unwrap();
        assert_eq!(keys, vec!["call_history:r1".to_string()]);
        db.close().await.unwrap();
    }
}
