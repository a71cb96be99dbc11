//! Request and response bodies for the HTTP endpoints.

use crate::error::PipelineError;
use crate::models::RecordId;
use crate::pipeline::{AnalyzeCommand, AnalyzeOutcome, IngestCommand, IngestOutcome};
use crate::scraper::parse_absolute_url;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MISSING_FIELDS: &str = "Missing required fields";

/// Body of `POST /ingest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestRequest {
    pub url: Option<String>,
    pub prompt_id: Option<RecordId>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl IngestRequest {
    /// Check required fields before anything is written.
    pub fn validate(self) -> Result<IngestCommand, PipelineError> {
        let url = self.url.map(|u| u.trim().to_string()).unwrap_or_default();
        let prompt_id = match (url.is_empty(), self.prompt_id) {
            (false, Some(prompt_id)) => prompt_id,
            _ => {
                return Err(PipelineError::validation(MISSING_FIELDS)
                    .with_details("url and prompt_id are required"))
            }
        };

        parse_absolute_url(&url)
            .map_err(|e| PipelineError::validation("Invalid URL").with_details(e))?;

        Ok(IngestCommand {
            url,
            caption: self.caption.unwrap_or_default(),
            prompt_id,
        })
    }
}

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub url_id: Option<RecordId>,
    pub prompt_id: Option<RecordId>,
}

impl AnalyzeRequest {
    pub fn validate(self) -> Result<AnalyzeCommand, PipelineError> {
        match (self.url_id, self.prompt_id) {
            (Some(url_id), Some(prompt_id)) => Ok(AnalyzeCommand { url_id, prompt_id }),
            _ => Err(PipelineError::validation(MISSING_FIELDS)
                .with_details("url_id and prompt_id are required")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub url_id: RecordId,
    pub url: String,
    pub summary: String,
    pub prompt_used: String,
    pub created_at: DateTime<Utc>,
    pub processed: bool,
    /// Id of the stored analysis; `null` when it could not be saved.
    pub summery_id: Option<RecordId>,
}

impl From<IngestOutcome> for IngestResponse {
    fn from(outcome: IngestOutcome) -> Self {
        Self {
            success: true,
            url_id: outcome.record.id,
            url: outcome.record.url,
            summary: outcome.analysis.output,
            prompt_used: outcome.analysis.prompt.text,
            created_at: outcome.record.created_at,
            processed: true,
            summery_id: outcome.analysis.saved.map(|saved| saved.id),
        }
    }
}

/// Failure after the URL was saved: the error plus the saved row.
#[derive(Debug, Clone, Serialize)]
pub struct IngestPartialFailure {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub url_id: RecordId,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub processed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub url_id: RecordId,
    pub url: String,
    pub original_caption: String,
    pub scraped_text_length: usize,
    pub ai_response: String,
    pub prompt_used: String,
    pub prompt_name: String,
    pub model: String,
    pub summery_id: Option<RecordId>,
}

impl From<AnalyzeOutcome> for AnalyzeResponse {
    fn from(outcome: AnalyzeOutcome) -> Self {
        let analysis = outcome.analysis;
        Self {
            success: true,
            url_id: outcome.record.id,
            url: outcome.record.url,
            original_caption: outcome.record.caption,
            scraped_text_length: analysis.scraped_text.chars().count(),
            ai_response: analysis.output,
            prompt_used: analysis.prompt.text,
            prompt_name: analysis.prompt.name,
            model: analysis.model,
            summery_id: analysis.saved.map(|saved| saved.id),
        }
    }
}

/// Query string of `GET /urls`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

impl ListParams {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 200;

    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store: &'static str,
    pub model: String,
}
