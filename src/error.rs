//! Pipeline error taxonomy.
//!
//! Component errors (`FetchError`, `CompletionError`, `StoreError`) stay close
//! to the component that raises them. The orchestrator maps each into a
//! [`PipelineError`], which carries the HTTP-facing classification and the
//! flat JSON body sent back to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::fmt;

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed request fields.
    Validation,
    /// The referenced URL or prompt does not exist.
    NotFound,
    /// The target site was unreachable or answered non-2xx.
    Fetch,
    /// The completion API was unreachable, misconfigured, or answered garbage.
    Completion,
    /// The store rejected a read or write.
    Persistence,
}

impl ErrorKind {
    /// HTTP status reported for this kind of failure.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Fetch | ErrorKind::Completion | ErrorKind::Persistence => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Fetch => write!(f, "fetch"),
            ErrorKind::Completion => write!(f, "completion"),
            ErrorKind::Persistence => write!(f, "persistence"),
        }
    }
}

/// A failed pipeline stage, ready to be reported to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} ({kind})")]
pub struct PipelineError {
    pub kind: ErrorKind,
    /// Short, stable description shown as `error`.
    pub message: String,
    /// Underlying cause shown as `details`.
    pub details: Option<String>,
}

impl PipelineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_details(mut self, details: impl ToString) -> Self {
        self.details = Some(details.to_string());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.message.clone(),
            details: self.details.clone(),
        }
    }
}

/// Flat JSON error body: `{ "error": ..., "details": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_status_mapping() {
        assert_eq!(ErrorKind::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Fetch.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ErrorKind::Completion.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorKind::Persistence.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_omits_missing_details() {
        let err = PipelineError::not_found("URL not found");
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "URL not found" }));

        let err = PipelineError::new(ErrorKind::Fetch, "Failed to scrape URL")
            .with_details("HTTP 503 from https://example.com/");
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["details"], "HTTP 503 from https://example.com/");
        assert_eq!(err.to_string(), "Failed to scrape URL (fetch)");
    }
}
