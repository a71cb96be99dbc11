//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.sitebrief.toml` files and command-line/environment overrides.

use crate::completion::CompletionSettings;
use crate::store::RestStoreSettings;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".sitebrief.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Row-store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Completion service settings.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Page fetcher settings.
    #[serde(default)]
    pub fetcher: FetcherConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind (host:port).
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

/// Which store backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgREST-compatible row-store.
    #[default]
    Rest,
    /// In-process tables, lost on exit.
    Memory,
}

/// Row-store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Row-store base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Row-store API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Table holding analysis results.
    #[serde(default = "default_analysis_table")]
    pub analysis_table: String,

    /// Prompt templates loaded into the memory backend at startup.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompts: Vec<SeedPrompt>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: None,
            api_key: None,
            analysis_table: default_analysis_table(),
            prompts: Vec::new(),
        }
    }
}

fn default_analysis_table() -> String {
    "summaries".to_string()
}

/// A prompt template declared in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPrompt {
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub description: String,
}

/// Completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Chat-completions endpoint URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key; requests fail until one is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens in the response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_api_url() -> String {
    CompletionSettings::default().api_url
}

fn default_model() -> String {
    CompletionSettings::default().model
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

/// Page fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent sent with every page request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; sitebrief/{})",
        env!("CARGO_PKG_VERSION")
    )
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given on the command line or through the environment
    /// override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref bind) = args.bind {
            self.server.bind = bind.clone();
        }

        if let Some(ref url) = args.store_url {
            self.store.url = Some(url.clone());
        }
        if let Some(ref key) = args.store_key {
            self.store.api_key = Some(key.clone());
        }
        if args.memory_store {
            self.store.backend = StoreBackend::Memory;
        }

        if let Some(ref key) = args.openai_api_key {
            self.completion.api_key = Some(key.clone());
        }
        if let Some(ref model) = args.model {
            self.completion.model = model.clone();
        }
    }

    /// Check that the selected backends have what they need.
    pub fn validate(&self) -> Result<()> {
        if self.store.backend == StoreBackend::Rest {
            if self.store.url.as_deref().map_or(true, str::is_empty) {
                bail!("Store URL is required for the rest backend (--store-url or SITEBRIEF_STORE_URL)");
            }
            if self.store.api_key.as_deref().map_or(true, str::is_empty) {
                bail!("Store API key is required for the rest backend (--store-key or SITEBRIEF_STORE_KEY)");
            }
        }
        if self.store.analysis_table.trim().is_empty() {
            bail!("Analysis table name must not be empty");
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            bail!("Temperature must be between 0.0 and 2.0");
        }
        if self.completion.max_tokens == 0 {
            bail!("max_tokens must be at least 1");
        }
        Ok(())
    }

    /// Whether a completion API key is present.
    pub fn has_completion_key(&self) -> bool {
        self.completion
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn completion_settings(&self) -> CompletionSettings {
        CompletionSettings {
            api_url: self.completion.api_url.clone(),
            api_key: self.completion.api_key.clone(),
            model: self.completion.model.clone(),
            max_tokens: self.completion.max_tokens,
            temperature: self.completion.temperature,
        }
    }

    /// Settings for the rest backend; `None` until url and key are set.
    pub fn rest_store_settings(&self) -> Option<RestStoreSettings> {
        Some(RestStoreSettings {
            base_url: self.store.url.clone()?,
            api_key: self.store.api_key.clone()?,
            analysis_table: self.store.analysis_table.clone(),
        })
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
