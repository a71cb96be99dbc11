//! Persistence for URLs, prompt templates, and analysis results.
//!
//! The pipeline talks to the store only through [`RecordStore`]. Two
//! backends exist: [`RestStore`] for a PostgREST-compatible row-store and
//! [`MemoryStore`] for local runs and tests.

pub mod memory;
pub mod prompts;
pub mod rest;

use crate::models::{
    AnalysisResult, NewAnalysisResult, NewUrlRecord, PromptTemplate, RecordId, UrlRecord,
};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use prompts::PromptResolver;
pub use rest::{RestStore, RestStoreSettings};

pub const URLS_TABLE: &str = "urls";
pub const PROMPTS_TABLE: &str = "prompts";

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row with this id exists.
    #[error("No row with id {id} in {table}")]
    NotFound { table: String, id: RecordId },

    /// The store could not be reached.
    #[error("Store request failed: {0}")]
    Request(String),

    /// The store answered with a non-2xx status.
    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The store answered with rows in an unexpected shape.
    #[error("Failed to decode store response: {0}")]
    Decode(String),

    /// An insert succeeded but returned no row.
    #[error("Insert into {0} returned no row")]
    Empty(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Row-level access to the tables the pipeline uses.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a URL; the store assigns `id` and `created_at`.
    async fn create_url_record(&self, record: NewUrlRecord) -> Result<UrlRecord, StoreError>;

    async fn read_url_record(&self, id: RecordId) -> Result<UrlRecord, StoreError>;

    async fn read_prompt(&self, id: RecordId) -> Result<PromptTemplate, StoreError>;

    /// Insert an analysis result; the store assigns `id` and `created_at`.
    async fn create_analysis_result(
        &self,
        result: NewAnalysisResult,
    ) -> Result<AnalysisResult, StoreError>;

    /// Most recently saved URLs first.
    async fn list_url_records(&self, limit: usize) -> Result<Vec<UrlRecord>, StoreError>;

    /// Analysis results for one URL, most recent first.
    async fn list_analysis_results(
        &self,
        url_id: RecordId,
    ) -> Result<Vec<AnalysisResult>, StoreError>;

    /// Backend name for logs and the health endpoint.
    fn name(&self) -> &'static str;
}
