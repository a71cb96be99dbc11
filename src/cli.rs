//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and environment fallbacks.

use clap::Parser;
use std::path::PathBuf;

/// Sitebrief - scrape a page, distill it, and record an LLM analysis
///
/// Runs an HTTP service that saves submitted URLs, extracts their text,
/// asks a completion model to analyze it with a stored prompt template,
/// and records the result.
///
/// Examples:
///   sitebrief --store-url https://xyz.supabase.co --store-key $KEY
///   sitebrief --memory-store --bind 0.0.0.0:8787
///   sitebrief --config ./deploy/sitebrief.toml -v
///   sitebrief --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, value_name = "ADDR", env = "SITEBRIEF_BIND")]
    pub bind: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .sitebrief.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Row-store base URL
    #[arg(long, value_name = "URL", env = "SITEBRIEF_STORE_URL")]
    pub store_url: Option<String>,

    /// Row-store API key
    #[arg(long, value_name = "KEY", env = "SITEBRIEF_STORE_KEY", hide_env_values = true)]
    pub store_key: Option<String>,

    /// Keep records in memory instead of a row-store
    #[arg(long)]
    pub memory_store: bool,

    /// API key for the completion service
    #[arg(long, value_name = "KEY", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Completion model identifier
    #[arg(short, long, value_name = "MODEL", env = "SITEBRIEF_MODEL")]
    pub model: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .sitebrief.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.store_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Store URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref bind) = self.bind {
            if bind.parse::<std::net::SocketAddr>().is_err() {
                return Err(format!("Invalid bind address: {}", bind));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            bind: None,
            config: None,
            store_url: Some("https://db.example".to_string()),
            store_key: Some("key".to_string()),
            memory_store: false,
            openai_api_key: None,
            model: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_store_url() {
        let mut args = make_args();
        args.store_url = Some("db.example".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_bind() {
        let mut args = make_args();
        args.bind = Some("localhost".to_string());
        assert!(args.validate().is_err());

        args.bind = Some("127.0.0.1:8787".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
