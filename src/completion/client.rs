//! Chat-completion client for page analysis.
//!
//! Every analysis is a single user message combining the prompt template,
//! the page URL, and the extracted page text. No history, no streaming.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Text returned when the service answers without any completion text.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response generated";

/// Errors raised while requesting a completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No API key is configured; nothing was sent.
    #[error("Completion API key is not configured")]
    MissingApiKey,

    /// The request could not be sent or the response could not be read.
    #[error("Failed to reach completion API at {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The service answered with a non-2xx status.
    #[error("Completion API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body was not the expected JSON shape.
    #[error("Failed to parse completion response: {0}")]
    Decode(String),
}

/// Inputs for one analysis.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt_text: String,
    pub url: String,
    pub scraped_text: String,
}

impl CompletionRequest {
    /// The single user message sent to the service.
    pub fn user_message(&self) -> String {
        format!(
            "{}\n\nWebsite URL: {}\nContent: {}",
            self.prompt_text, self.url, self.scraped_text
        )
    }
}

/// The analysis text produced for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// True when the service returned no text and the placeholder was used.
    pub placeholder: bool,
}

/// Generates analysis text for a page.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError>;

    /// Model identifier reported back to callers.
    fn model(&self) -> &str;
}

/// Settings for [`OpenAiCompletionClient`].
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    /// Full chat-completions endpoint URL.
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// First choice's text, or the placeholder when there is none.
    fn into_completion(self) -> Completion {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty());

        match text {
            Some(text) => Completion {
                text,
                placeholder: false,
            },
            None => Completion {
                text: NO_RESPONSE_PLACEHOLDER.to_string(),
                placeholder: true,
            },
        }
    }
}

/// [`CompletionClient`] for OpenAI-compatible chat-completions APIs.
pub struct OpenAiCompletionClient {
    settings: CompletionSettings,
    http_client: reqwest::Client,
}

impl OpenAiCompletionClient {
    pub fn new(settings: CompletionSettings) -> Self {
        info!(
            "Completion client using model {} at {}",
            settings.model, settings.api_url
        );
        Self {
            settings,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(CompletionError::MissingApiKey)?;

        let content = request.user_message();
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &content,
            }],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        debug!(
            "Requesting completion for {} ({} chars of content)",
            request.url,
            request.scraped_text.chars().count()
        );

        let transport = |e: reqwest::Error| CompletionError::Transport {
            endpoint: self.settings.api_url.clone(),
            message: e.to_string(),
        };

        let response = self
            .http_client
            .post(&self.settings.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api { status, body });
        }

        let raw = response.text().await.map_err(transport)?;
        let parsed: ChatResponse =
            serde_json::from_str(&raw).map_err(|e| CompletionError::Decode(e.to_string()))?;

        Ok(parsed.into_completion())
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn request() -> CompletionRequest {
        CompletionRequest {
            prompt_text: "Summarize the page.".to_string(),
            url: "https://example.com".to_string(),
            scraped_text: "Hello World".to_string(),
        }
    }

    fn settings(api_url: String) -> CompletionSettings {
        CompletionSettings {
            api_url,
            api_key: Some("sk-test".to_string()),
            ..CompletionSettings::default()
        }
    }

    #[test]
    fn test_user_message_format() {
        assert_eq!(
            request().user_message(),
            "Summarize the page.\n\nWebsite URL: https://example.com\nContent: Hello World"
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = CompletionSettings::default();
        assert_eq!(settings.max_tokens, 500);
        assert_eq!(settings.temperature, 0.7);
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_missing_choice_text_falls_back() {
        for body in [
            json!({ "choices": [] }),
            json!({}),
            json!({ "choices": [{ "message": {} }] }),
            json!({ "choices": [{ "message": { "content": null } }] }),
            json!({ "choices": [{ "message": { "content": "" } }] }),
        ] {
            let parsed: ChatResponse = serde_json::from_value(body).unwrap();
            let completion = parsed.into_completion();
            assert_eq!(completion.text, NO_RESPONSE_PLACEHOLDER);
            assert!(completion.placeholder);
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_checked_before_call() {
        let client = OpenAiCompletionClient::new(CompletionSettings {
            api_url: "http://127.0.0.1:9/unreachable".to_string(),
            api_key: Some("   ".to_string()),
            ..CompletionSettings::default()
        });
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_complete_sends_single_message() {
        let seen: Arc<Mutex<Option<(Value, String)>>> = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    *captured.lock().unwrap() = Some((body, auth));
                    Json(json!({
                        "choices": [{ "message": { "role": "assistant", "content": "A short page." } }]
                    }))
                }
            }),
        );
        let base = spawn_server(app).await;

        let client = OpenAiCompletionClient::new(settings(format!("{}/v1/chat/completions", base)));
        let completion = client.complete(&request()).await.unwrap();
        assert_eq!(completion.text, "A short page.");
        assert!(!completion.placeholder);

        let (body, auth) = seen.lock().unwrap().take().unwrap();
        assert_eq!(auth, "Bearer sk-test");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 500);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], request().user_message());
        assert!(body.get("stream").is_none());
    }

    #[tokio::test]
    async fn test_api_error_surfaces_status_and_body() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") }),
        );
        let base = spawn_server(app).await;

        let client = OpenAiCompletionClient::new(settings(format!("{}/v1/chat/completions", base)));
        match client.complete(&request()).await.unwrap_err() {
            CompletionError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_response() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { "this is not json" }),
        );
        let base = spawn_server(app).await;

        let client = OpenAiCompletionClient::new(settings(format!("{}/v1/chat/completions", base)));
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Decode(_)));
    }
}
