//! Pipeline orchestration.
//!
//! Two request-driven flows share one tail:
//!
//! - ingest-and-analyze: insert URL, resolve prompt, scrape, complete, persist
//! - analyze-existing: read URL, resolve prompt, scrape, complete, persist
//!
//! Each step awaits one external call before the next begins. Once the URL
//! row exists, later failures are reported alongside it instead of discarding
//! it. A failed analysis-result write is logged and the run still succeeds.

mod types;

pub use types::{
    Analysis, AnalyzeCommand, AnalyzeOutcome, IngestCommand, IngestFailure, IngestOutcome, Stage,
};

use crate::completion::{CompletionClient, CompletionRequest, OpenAiCompletionClient};
use crate::config::{Config, StoreBackend};
use crate::error::{ErrorKind, PipelineError};
use crate::models::{NewAnalysisResult, NewUrlRecord, PromptTemplate, RecordId, UrlRecord};
use crate::scraper::{extract_text, ContentFetcher, HttpFetcher};
use crate::store::{MemoryStore, PromptResolver, RecordStore, RestStore, StoreError};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const SAVE_URL_FAILED: &str = "Failed to save URL";
pub const URL_NOT_FOUND: &str = "URL not found";
pub const URL_LOOKUP_FAILED: &str = "Failed to fetch URL from database";
pub const PROMPT_LOOKUP_FAILED: &str = "Failed to fetch prompt from database";
pub const PROMPT_NOT_FOUND: &str = "Prompt not found";
pub const SCRAPE_FAILED: &str = "Failed to scrape URL";
pub const COMPLETION_FAILED: &str = "Failed to generate AI analysis";

/// Stateless orchestrator over the store, fetcher, and completion client.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn RecordStore>,
    prompts: PromptResolver,
    fetcher: Arc<dyn ContentFetcher>,
    completer: Arc<dyn CompletionClient>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        fetcher: Arc<dyn ContentFetcher>,
        completer: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            prompts: PromptResolver::new(store.clone()),
            store,
            fetcher,
            completer,
        }
    }

    /// Build the production collaborators described by `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn RecordStore> = match config.store.backend {
            StoreBackend::Rest => {
                let settings = config
                    .rest_store_settings()
                    .context("Store URL and API key are required for the rest backend")?;
                info!("Using row-store at {}", settings.base_url);
                Arc::new(RestStore::new(settings))
            }
            StoreBackend::Memory => {
                let store = MemoryStore::new();
                for prompt in &config.store.prompts {
                    let id = store
                        .insert_prompt(&prompt.name, &prompt.text, &prompt.description)
                        .await;
                    info!("Seeded prompt {} as #{}", prompt.name, id);
                }
                warn!("Using in-memory store; records are lost on exit");
                Arc::new(store)
            }
        };

        let fetcher = HttpFetcher::new(&config.fetcher.user_agent)
            .context("Failed to build page fetcher")?;
        let completer = OpenAiCompletionClient::new(config.completion_settings());

        Ok(Self::new(store, Arc::new(fetcher), Arc::new(completer)))
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn model(&self) -> &str {
        self.completer.model()
    }

    /// Save a new URL, then analyze it.
    ///
    /// Failures after the insert carry the saved record so the caller can
    /// still report its id.
    pub async fn ingest_and_analyze(
        &self,
        command: IngestCommand,
    ) -> Result<IngestOutcome, IngestFailure> {
        debug!(
            "{}: ingest {} with prompt {}",
            Stage::Received,
            command.url,
            command.prompt_id
        );

        let record = self
            .store
            .create_url_record(NewUrlRecord {
                url: command.url.clone(),
                caption: command.caption,
            })
            .await
            .map_err(|e| {
                error!("Failed to save {}: {}", command.url, e);
                IngestFailure {
                    error: PipelineError::new(ErrorKind::Persistence, SAVE_URL_FAILED)
                        .with_details(e),
                    record: None,
                }
            })?;
        info!("{}: saved {} as url #{}", Stage::Inserted, record.url, record.id);

        let salvage = |error: PipelineError| {
            error!("Ingest of url #{} failed: {}", record.id, error);
            IngestFailure {
                error,
                record: Some(record.clone()),
            }
        };

        let prompt = self
            .resolve_prompt(command.prompt_id, PROMPT_LOOKUP_FAILED)
            .await
            .map_err(salvage)?;
        let analysis = self.analyze(&record, prompt).await.map_err(salvage)?;

        Ok(IngestOutcome { record, analysis })
    }

    /// Analyze a URL that is already saved.
    pub async fn analyze_existing(
        &self,
        command: AnalyzeCommand,
    ) -> Result<AnalyzeOutcome, PipelineError> {
        debug!(
            "{}: analyze url #{} with prompt {}",
            Stage::Received,
            command.url_id,
            command.prompt_id
        );

        let record = self
            .store
            .read_url_record(command.url_id)
            .await
            .map_err(|e| lookup_error(e, URL_NOT_FOUND, URL_LOOKUP_FAILED))?;
        info!("{}: url #{} is {}", Stage::UrlFetched, record.id, record.url);

        let prompt = self
            .resolve_prompt(command.prompt_id, PROMPT_NOT_FOUND)
            .await?;
        let analysis = self.analyze(&record, prompt).await.map_err(|e| {
            error!("Analysis of url #{} failed: {}", record.id, e);
            e
        })?;

        Ok(AnalyzeOutcome { record, analysis })
    }

    async fn resolve_prompt(
        &self,
        prompt_id: RecordId,
        not_found: &str,
    ) -> Result<PromptTemplate, PipelineError> {
        let prompt = self
            .prompts
            .resolve(prompt_id)
            .await
            .map_err(|e| lookup_error(e, not_found, PROMPT_LOOKUP_FAILED))?;
        info!("{}: using prompt {}", Stage::PromptResolved, prompt);
        Ok(prompt)
    }

    /// Shared tail of both flows: scrape, complete, persist.
    async fn analyze(
        &self,
        record: &UrlRecord,
        prompt: PromptTemplate,
    ) -> Result<Analysis, PipelineError> {
        let page = self.fetcher.fetch(&record.url).await.map_err(|e| {
            PipelineError::new(ErrorKind::Fetch, SCRAPE_FAILED).with_details(e)
        })?;
        let scraped_text = extract_text(&page.body);
        info!(
            "{}: {} bytes of markup reduced to {} chars",
            Stage::Scraped,
            page.body.len(),
            scraped_text.chars().count()
        );

        let request = CompletionRequest {
            prompt_text: prompt.text.clone(),
            url: record.url.clone(),
            scraped_text,
        };
        let completion = self.completer.complete(&request).await.map_err(|e| {
            PipelineError::new(ErrorKind::Completion, COMPLETION_FAILED).with_details(e)
        })?;
        if completion.placeholder {
            warn!("Completion for url #{} contained no text", record.id);
        }
        info!("{}: {} chars of output", Stage::Completed, completion.text.len());

        let saved = match self
            .store
            .create_analysis_result(NewAnalysisResult {
                url_id: record.id,
                prompt_id: prompt.id,
                scraped_text: request.scraped_text.clone(),
                model_output: completion.text.clone(),
            })
            .await
        {
            Ok(saved) => {
                info!("{}: analysis #{} for url #{}", Stage::Persisted, saved.id, record.id);
                Some(saved)
            }
            Err(e) => {
                warn!(
                    "{}: analysis for url #{} not saved: {}",
                    Stage::PersistenceFailed,
                    record.id,
                    e
                );
                None
            }
        };

        Ok(Analysis {
            prompt,
            scraped_text: request.scraped_text,
            output: completion.text,
            model: self.completer.model().to_string(),
            saved,
        })
    }
}

/// Map a store read failure: missing rows are 404s, anything else is a store fault.
fn lookup_error(e: StoreError, not_found: &str, failed: &str) -> PipelineError {
    if e.is_not_found() {
        PipelineError::new(ErrorKind::NotFound, not_found).with_details(e)
    } else {
        PipelineError::new(ErrorKind::Persistence, failed).with_details(e)
    }
}
