use crate::error::PipelineError;
use crate::models::{AnalysisResult, PromptTemplate, RecordId, UrlRecord};
use std::fmt;

/// Pipeline steps, as they appear in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Inserted,
    UrlFetched,
    PromptResolved,
    Scraped,
    Completed,
    Persisted,
    PersistenceFailed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Inserted => "inserted",
            Stage::UrlFetched => "url_fetched",
            Stage::PromptResolved => "prompt_resolved",
            Stage::Scraped => "scraped",
            Stage::Completed => "completed",
            Stage::Persisted => "persisted",
            Stage::PersistenceFailed => "persistence_failed",
        };
        f.write_str(name)
    }
}

/// A validated ingest request.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestCommand {
    pub url: String,
    pub caption: String,
    pub prompt_id: RecordId,
}

/// A validated analyze-existing request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzeCommand {
    pub url_id: RecordId,
    pub prompt_id: RecordId,
}

/// What the shared scrape-complete-persist tail produced.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub prompt: PromptTemplate,
    pub scraped_text: String,
    /// Completion text, or the placeholder when the service returned none.
    pub output: String,
    pub model: String,
    /// The stored row; `None` when the write failed.
    pub saved: Option<AnalysisResult>,
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub record: UrlRecord,
    pub analysis: Analysis,
}

/// A failed ingest, with the URL row if it was saved before the failure.
#[derive(Debug, Clone)]
pub struct IngestFailure {
    pub error: PipelineError,
    pub record: Option<UrlRecord>,
}

#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub record: UrlRecord,
    pub analysis: Analysis,
}
