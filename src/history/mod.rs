// history/mod.rs - Compression history store

mod memory;
mod sqlite;
mod supabase;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{HistoryRecord, ImageInfo};

/// Error types for the history store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    // Defined for symmetry; delete is idempotent and never reports it
    #[error("Record not found: {0}")]
    NotFound(String),
}

/// CRUD surface shared by every history backend
///
/// `create` assigns `id` and `created_at` at the store layer; client-supplied
/// values for either are never trusted. `list` returns records most recent
/// first. `delete` is idempotent: removing an absent id is a no-op success.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn create(&self, image_info: ImageInfo) -> Result<HistoryRecord, StoreError>;

    async fn list(&self) -> Result<Vec<HistoryRecord>, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Which backend to run against, chosen once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Sqlite,
    Supabase,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Sqlite => "sqlite",
            BackendKind::Supabase => "supabase",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "sqlite" => Ok(BackendKind::Sqlite),
            "supabase" => Ok(BackendKind::Supabase),
            other => Err(format!("Unknown history backend: {}", other)),
        }
    }
}
