//! Data models for the analysis pipeline.
//!
//! These are the rows the pipeline reads from and writes to the store:
//! saved URLs, prompt templates, and analysis results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the store to every row.
pub type RecordId = i64;

/// Upper bound on extracted page text, in characters.
///
/// Applies both to what is stored and to what is sent for completion.
pub const MAX_SCRAPED_CHARS: usize = 8000;

/// Nullable text columns read back as empty strings.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A URL submitted for analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// Store-assigned creation time.
    pub created_at: DateTime<Utc>,
    /// Absolute URL of the page.
    pub url: String,
    /// Free-text caption supplied at ingest time.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub caption: String,
}

/// Columns supplied by the caller when saving a URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUrlRecord {
    pub url: String,
    pub caption: String,
}

/// A named instruction template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: RecordId,
    pub name: String,
    /// Instruction body placed ahead of the page content.
    #[serde(rename = "prompt_text")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

/// The recorded outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: RecordId,
    pub url_id: RecordId,
    pub prompt_id: RecordId,
    /// Extracted page text, at most [`MAX_SCRAPED_CHARS`] characters.
    pub scraped_text: String,
    /// Text returned by the completion service.
    pub model_output: String,
    pub created_at: DateTime<Utc>,
}

/// Columns supplied by the caller when saving an analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAnalysisResult {
    pub url_id: RecordId,
    pub prompt_id: RecordId,
    pub scraped_text: String,
    pub model_output: String,
}
