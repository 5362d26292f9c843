// history/sqlite.rs - SQLite relational history backend

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{HistoryStore, StoreError};
use crate::models::{HistoryRecord, ImageInfo};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS compression_history (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    user_id TEXT,
    image_info TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_compression_history_created_at
    ON compression_history (created_at DESC);
";

/// Relational store over a single SQLite connection
///
/// `image_info` is persisted as an opaque JSON text blob; `users` exists as
/// the foreign-key target for `user_id`, which stays unenforced.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database at an explicit path
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(to_backend_error)?;

        // Recommended SQLite settings
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(to_backend_error)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(to_backend_error)?;

        conn.execute_batch(SCHEMA).map_err(to_backend_error)?;

        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }
}

fn to_backend_error(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, Option<String>, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode_record(
    (id, created_at, user_id, image_info): (String, String, Option<String>, String),
) -> Result<HistoryRecord, StoreError> {
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StoreError::Backend(format!("Bad timestamp in row {}: {}", id, e)))?
        .with_timezone(&Utc);

    let image_info: ImageInfo = serde_json::from_str(&image_info)
        .map_err(|e| StoreError::Backend(format!("Bad image_info in row {}: {}", id, e)))?;

    Ok(HistoryRecord {
        id,
        created_at,
        user_id,
        image_info,
    })
}

#[async_trait]
impl HistoryStore for SqliteStore {
    async fn create(&self, image_info: ImageInfo) -> Result<HistoryRecord, StoreError> {
        let record = HistoryRecord {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            user_id: None,
            image_info,
        };

        let encoded = serde_json::to_string(&record.image_info)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        conn.execute(
            "INSERT INTO compression_history (id, created_at, user_id, image_info)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id,
                record.created_at.to_rfc3339(),
                record.user_id,
                encoded,
            ],
        )
        .map_err(to_backend_error)?;

        Ok(record)
    }

    async fn list(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, created_at, user_id, image_info
                 FROM compression_history
                 ORDER BY created_at DESC",
            )
            .map_err(to_backend_error)?;

        let rows = stmt
            .query_map([], row_to_record)
            .map_err(to_backend_error)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(decode_record(row.map_err(to_backend_error)?)?);
        }
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        // Idempotent: zero affected rows is still success
        conn.execute("DELETE FROM compression_history WHERE id = ?1", params![id])
            .map_err(to_backend_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CompressionSettings;

    fn open_temp_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_at(&dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn sample_info(name: &str) -> ImageInfo {
        ImageInfo {
            original_name: name.to_string(),
            original_size: 2048,
            original_format: "jpeg".to_string(),
            original_width: 100,
            original_height: 50,
            compressed_size: Some(512),
            compressed_width: Some(100),
            compressed_height: Some(50),
            compression_ratio: Some(0.75),
            settings: Some(CompressionSettings::default()),
        }
    }

    #[tokio::test]
    async fn test_create_then_list_round_trip() {
        let (_dir, store) = open_temp_store();

        let info = sample_info("vacation.jpg");
        let created = store.create(info.clone()).await.unwrap();
        assert!(!created.id.is_empty());

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, created.id);
        assert_eq!(records[0].image_info, info);
    }

    #[tokio::test]
    async fn test_list_orders_most_recent_first() {
        let (_dir, store) = open_temp_store();

        for name in ["a.png", "b.png", "c.png"] {
            store.create(sample_info(name)).await.unwrap();
        }

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 3);
        for pair in records.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, store) = open_temp_store();

        let created = store.create(sample_info("a.png")).await.unwrap();
        store.delete(&created.id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        store.delete(&created.id).await.unwrap();
        store.delete("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn test_reopen_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let created = {
            let store = SqliteStore::open_at(&path).unwrap();
            store.create(sample_info("persisted.png")).await.unwrap()
        };

        let store = SqliteStore::open_at(&path).unwrap();
        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, created.id);
        assert_eq!(records[0].image_info.original_name, "persisted.png");
    }
}
