//! PostgREST-compatible row-store backend.
//!
//! Speaks the REST dialect exposed by PostgREST and Supabase:
//! `{base}/rest/v1/{table}` with `apikey` + bearer auth, equality filters as
//! `column=eq.value`, and `Prefer: return=representation` on inserts so the
//! stored row (with its assigned id and timestamp) comes back.

use super::{RecordStore, StoreError, PROMPTS_TABLE, URLS_TABLE};
use crate::models::{
    AnalysisResult, NewAnalysisResult, NewUrlRecord, PromptTemplate, RecordId, UrlRecord,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Connection settings for [`RestStore`].
#[derive(Debug, Clone)]
pub struct RestStoreSettings {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    pub api_key: String,
    /// Table holding analysis results.
    pub analysis_table: String,
}

pub struct RestStore {
    settings: RestStoreSettings,
    client: Client,
}

impl RestStore {
    pub fn new(settings: RestStoreSettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.settings.base_url.trim_end_matches('/'),
            table
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.settings.api_key)
            .bearer_auth(&self.settings.api_key)
    }

    async fn send(builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }
        Ok(response)
    }

    async fn rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, StoreError> {
        let raw = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Insert one row and return the stored representation.
    async fn insert<B, T>(&self, table: &str, row: &B) -> Result<T, StoreError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        debug!("Inserting into {}", table);
        let builder = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(row);
        let response = Self::send(builder).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Empty(table.to_string()))
    }

    /// Select rows matching `query`.
    async fn select<T: DeserializeOwned + Send>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        debug!("Selecting from {} with {:?}", table, query);
        let builder = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&[("select", "*")])
            .query(query);
        let response = Self::send(builder).await?;
        Self::rows(response).await
    }

    async fn select_by_id<T: DeserializeOwned + Send>(
        &self,
        table: &str,
        id: RecordId,
    ) -> Result<T, StoreError> {
        self.select(table, &[("id", format!("eq.{}", id))])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id,
            })
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn create_url_record(&self, record: NewUrlRecord) -> Result<UrlRecord, StoreError> {
        self.insert(URLS_TABLE, &record).await
    }

    async fn read_url_record(&self, id: RecordId) -> Result<UrlRecord, StoreError> {
        self.select_by_id(URLS_TABLE, id).await
    }

    async fn read_prompt(&self, id: RecordId) -> Result<PromptTemplate, StoreError> {
        self.select_by_id(PROMPTS_TABLE, id).await
    }

    async fn create_analysis_result(
        &self,
        result: NewAnalysisResult,
    ) -> Result<AnalysisResult, StoreError> {
        self.insert(&self.settings.analysis_table, &result).await
    }

    async fn list_url_records(&self, limit: usize) -> Result<Vec<UrlRecord>, StoreError> {
        self.select(
            URLS_TABLE,
            &[
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn list_analysis_results(
        &self,
        url_id: RecordId,
    ) -> Result<Vec<AnalysisResult>, StoreError> {
        self.select(
            &self.settings.analysis_table,
            &[
                ("url_id", format!("eq.{}", url_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}
