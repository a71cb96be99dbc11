//! In-process store backend.
//!
//! Holds the three tables in memory for local runs without a row-store.
//! Contents are lost on exit.

use super::{RecordStore, StoreError, PROMPTS_TABLE, URLS_TABLE};
use crate::models::{
    AnalysisResult, NewAnalysisResult, NewUrlRecord, PromptTemplate, RecordId, UrlRecord,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    urls: Vec<UrlRecord>,
    prompts: Vec<PromptTemplate>,
    analyses: Vec<AnalysisResult>,
    next_id: RecordId,
}

impl Tables {
    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prompt template and return its id.
    pub async fn insert_prompt(&self, name: &str, text: &str, description: &str) -> RecordId {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        tables.prompts.push(PromptTemplate {
            id,
            name: name.to_string(),
            text: text.to_string(),
            description: description.to_string(),
        });
        id
    }

    #[cfg(test)]
    pub async fn remove_prompt(&self, id: RecordId) {
        self.tables.write().await.prompts.retain(|p| p.id != id);
    }

    #[cfg(test)]
    pub async fn analysis_count(&self) -> usize {
        self.tables.read().await.analyses.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_url_record(&self, record: NewUrlRecord) -> Result<UrlRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let row = UrlRecord {
            id: tables.allocate_id(),
            created_at: Utc::now(),
            url: record.url,
            caption: record.caption,
        };
        tables.urls.push(row.clone());
        Ok(row)
    }

    async fn read_url_record(&self, id: RecordId) -> Result<UrlRecord, StoreError> {
        self.tables
            .read()
            .await
            .urls
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                table: URLS_TABLE.to_string(),
                id,
            })
    }

    async fn read_prompt(&self, id: RecordId) -> Result<PromptTemplate, StoreError> {
        self.tables
            .read()
            .await
            .prompts
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                table: PROMPTS_TABLE.to_string(),
                id,
            })
    }

    async fn create_analysis_result(
        &self,
        result: NewAnalysisResult,
    ) -> Result<AnalysisResult, StoreError> {
        let mut tables = self.tables.write().await;

        // Mirror the foreign keys a relational store would enforce.
        if !tables.urls.iter().any(|row| row.id == result.url_id) {
            return Err(StoreError::Status {
                status: 409,
                body: format!("url_id {} does not exist", result.url_id),
            });
        }
        if !tables.prompts.iter().any(|row| row.id == result.prompt_id) {
            return Err(StoreError::Status {
                status: 409,
                body: format!("prompt_id {} does not exist", result.prompt_id),
            });
        }

        let row = AnalysisResult {
            id: tables.allocate_id(),
            url_id: result.url_id,
            prompt_id: result.prompt_id,
            scraped_text: result.scraped_text,
            model_output: result.model_output,
            created_at: Utc::now(),
        };
        tables.analyses.push(row.clone());
        Ok(row)
    }

    async fn list_url_records(&self, limit: usize) -> Result<Vec<UrlRecord>, StoreError> {
        // Rows are appended in creation order; ids break timestamp ties.
        let tables = self.tables.read().await;
        Ok(tables.urls.iter().rev().take(limit).cloned().collect())
    }

    async fn list_analysis_results(
        &self,
        url_id: RecordId,
    ) -> Result<Vec<AnalysisResult>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .analyses
            .iter()
            .rev()
            .filter(|row| row.url_id == url_id)
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
