// history/supabase.rs - Supabase (PostgREST) remote history backend

use async_trait::async_trait;
use serde::Serialize;

use super::{HistoryStore, StoreError};
use crate::logger::Logger;
use crate::models::{HistoryRecord, ImageInfo};

const TABLE: &str = "compression_history";

/// Direct remote-table store over Supabase's REST interface
///
/// The HTTP client is constructed by the caller and owned by the store, so
/// nothing reaches for ambient process-wide state. Reads are best-effort
/// (failures degrade to an empty list plus a warning); writes are strict.
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    logger: Logger,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    image_info: &'a ImageInfo,
}

impl SupabaseStore {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str, logger: Logger) -> Self {
        SupabaseStore {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            logger,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl HistoryStore for SupabaseStore {
    async fn create(&self, image_info: ImageInfo) -> Result<HistoryRecord, StoreError> {
        let response = self
            .request(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&InsertRow {
                image_info: &image_info,
            })
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        // PostgREST answers an insert with the array of created rows
        let mut rows: Vec<HistoryRecord> = response
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.pop()
            .ok_or_else(|| StoreError::Backend("Insert returned no rows".to_string()))
    }

    async fn list(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        let result = async {
            self.request(self.client.get(self.table_url()))
                .query(&[("select", "*"), ("order", "created_at.desc")])
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<HistoryRecord>>()
                .await
        }
        .await;

        // Reads degrade to an empty list rather than failing the caller
        match result {
            Ok(rows) => Ok(rows),
            Err(e) => {
                self.logger.warn(
                    "Failed to fetch compression history",
                    &serde_json::json!({ "error": e.to_string() }),
                );
                Ok(Vec::new())
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.request(self.client.delete(self.table_url()))
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        // Deleting an absent id matches zero rows, which PostgREST reports
        // as success; idempotence comes for free
        Ok(())
    }
}
