//! Helpers shared by the inline test modules.

use crate::completion::{Completion, CompletionClient, CompletionError, CompletionRequest};
use crate::models::{
    AnalysisResult, NewAnalysisResult, NewUrlRecord, PromptTemplate, RecordId, UrlRecord,
};
use crate::scraper::{ContentFetcher, FetchError, FetchedPage};
use crate::store::{MemoryStore, RecordStore, StoreError};
use async_trait::async_trait;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("test listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{}", addr)
}

/// Fetcher that answers every URL with the same page or status.
pub struct FakeFetcher {
    response: Result<String, u16>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn page(body: &str) -> Self {
        Self {
            response: Ok(body.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            response: Err(status),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(body) => Ok(FetchedPage {
                status: 200,
                body: body.clone(),
            }),
            Err(status) => Err(FetchError::Status {
                status: *status,
                url: url.to_string(),
            }),
        }
    }
}

/// Completion client with a canned reply that records what it was sent.
pub struct FakeCompleter {
    reply: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompleter {
    pub fn reply(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Some(text) => Ok(Completion {
                text: text.clone(),
                placeholder: false,
            }),
            None => Err(CompletionError::Api {
                status: 500,
                body: "upstream exploded".to_string(),
            }),
        }
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

/// Memory store whose inserts can be told to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_url_inserts: bool,
    fail_analysis_inserts: bool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_url_inserts(mut self) -> Self {
        self.fail_url_inserts = true;
        self
    }

    pub fn fail_analysis_inserts(mut self) -> Self {
        self.fail_analysis_inserts = true;
        self
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

fn unavailable() -> StoreError {
    StoreError::Status {
        status: 503,
        body: "store unavailable".to_string(),
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn create_url_record(&self, record: NewUrlRecord) -> Result<UrlRecord, StoreError> {
        if self.fail_url_inserts {
            return Err(unavailable());
        }
        self.inner.create_url_record(record).await
    }

    async fn read_url_record(&self, id: RecordId) -> Result<UrlRecord, StoreError> {
        self.inner.read_url_record(id).await
    }

    async fn read_prompt(&self, id: RecordId) -> Result<PromptTemplate, StoreError> {
        self.inner.read_prompt(id).await
    }

    async fn create_analysis_result(
        &self,
        result: NewAnalysisResult,
    ) -> Result<AnalysisResult, StoreError> {
        if self.fail_analysis_inserts {
            return Err(unavailable());
        }
        self.inner.create_analysis_result(result).await
    }

    async fn list_url_records(&self, limit: usize) -> Result<Vec<UrlRecord>, StoreError> {
        self.inner.list_url_records(limit).await
    }

    async fn list_analysis_results(
        &self,
        url_id: RecordId,
    ) -> Result<Vec<AnalysisResult>, StoreError> {
        self.inner.list_analysis_results(url_id).await
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}
