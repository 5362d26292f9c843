// history/memory.rs - In-memory history backend

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{HistoryStore, StoreError};
use crate::models::{HistoryRecord, ImageInfo};

/// Map-backed fallback store
///
/// Process-lifetime state only; nothing survives a restart. Intended as a
/// fallback and test double, not as a deployed backend of record. Ids are
/// sequential integers rendered as strings.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

struct Inner {
    records: HashMap<String, HistoryRecord>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            inner: Mutex::new(Inner {
                records: HashMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn create(&self, image_info: ImageInfo) -> Result<HistoryRecord, StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let id = inner.next_id.to_string();
        inner.next_id += 1;

        let record = HistoryRecord {
            id: id.clone(),
            created_at: Utc::now(),
            user_id: None,
            image_info,
        };

        inner.records.insert(id, record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut records: Vec<HistoryRecord> = inner.records.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        inner.records.remove(id);
        Ok(())
    }
}
