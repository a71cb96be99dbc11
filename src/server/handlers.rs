use super::types::{
    AnalyzeRequest, AnalyzeResponse, HealthResponse, IngestPartialFailure, IngestRequest,
    IngestResponse, ListParams,
};
use super::AppState;
use crate::error::{ErrorKind, PipelineError};
use crate::models::RecordId;
use crate::pipeline::{IngestFailure, URL_LOOKUP_FAILED, URL_NOT_FOUND};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

fn invalid_body(rejection: JsonRejection) -> PipelineError {
    PipelineError::validation("Invalid request body").with_details(rejection.body_text())
}

pub async fn ingest_handler(
    State(state): State<AppState>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Response {
    let command = match payload.map_err(invalid_body).and_then(|Json(req)| req.validate()) {
        Ok(command) => command,
        Err(e) => return e.into_response(),
    };

    match state.pipeline.ingest_and_analyze(command).await {
        Ok(outcome) => (StatusCode::OK, Json(IngestResponse::from(outcome))).into_response(),
        Err(IngestFailure {
            error,
            record: Some(record),
        }) => {
            let body = IngestPartialFailure {
                success: false,
                error: error.message.clone(),
                details: error.details.clone(),
                url_id: record.id,
                url: record.url,
                created_at: record.created_at,
                processed: false,
            };
            (error.status(), Json(body)).into_response()
        }
        Err(IngestFailure {
            error,
            record: None,
        }) => error.into_response(),
    }
}

pub async fn analyze_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let command = match payload.map_err(invalid_body).and_then(|Json(req)| req.validate()) {
        Ok(command) => command,
        Err(e) => return e.into_response(),
    };

    match state.pipeline.analyze_existing(command).await {
        Ok(outcome) => (StatusCode::OK, Json(AnalyzeResponse::from(outcome))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Answers bare OPTIONS requests; real CORS preflights are answered by the CORS layer.
pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store: state.pipeline.store().name(),
        model: state.pipeline.model().to_string(),
    })
}

pub async fn list_urls_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let limit = params.limit();
    debug!("Listing up to {} urls", limit);
    match state.pipeline.store().list_url_records(limit).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => PipelineError::new(ErrorKind::Persistence, "Failed to list URLs")
            .with_details(e)
            .into_response(),
    }
}

pub async fn list_analyses_handler(
    State(state): State<AppState>,
    Path(url_id): Path<RecordId>,
) -> Response {
    let store = state.pipeline.store();

    if let Err(e) = store.read_url_record(url_id).await {
        let err = if e.is_not_found() {
            PipelineError::not_found(URL_NOT_FOUND)
        } else {
            PipelineError::new(ErrorKind::Persistence, URL_LOOKUP_FAILED).with_details(e)
        };
        return err.into_response();
    }

    match store.list_analysis_results(url_id).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => PipelineError::new(ErrorKind::Persistence, "Failed to list analyses")
            .with_details(e)
            .into_response(),
    }
}
