//! Outbound page retrieval.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Errors raised while retrieving a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The target is not an absolute http(s) URL; nothing was sent.
    #[error("Invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The site answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// DNS, TLS, connection, or body-read failure.
    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },
}

/// A successfully retrieved page body.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// Retrieves raw page content for a URL.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Parse `raw` as an absolute http or https URL.
pub fn parse_absolute_url(raw: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let parsed = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(parsed)
}

/// [`ContentFetcher`] backed by a shared `reqwest` client.
///
/// One GET per call with a fixed `User-Agent`. Redirects follow reqwest's
/// defaults; no timeout or retry is configured.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    user_agent: HeaderValue,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| anyhow::anyhow!("Invalid user agent {:?}: {}", user_agent, e))?;
        Ok(Self {
            client: Client::new(),
            user_agent,
        })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let target = parse_absolute_url(url)?;
        debug!("Fetching {}", target);

        let network = |e: reqwest::Error| FetchError::Network {
            url: target.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(target.clone())
            .header(USER_AGENT, self.user_agent.clone())
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: target.to_string(),
            });
        }

        let body = response.text().await.map_err(network)?;
        debug!("Fetched {} bytes from {}", body.len(), target);

        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;

    const AGENT: &str = "sitebrief-test/1.0";

    #[test]
    fn test_parse_absolute_url() {
        assert!(parse_absolute_url("https://example.com").is_ok());
        assert!(parse_absolute_url("http://localhost:8080/a?b=c").is_ok());
        assert!(matches!(
            parse_absolute_url("example.com"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_absolute_url("/relative/path"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_absolute_url("ftp://example.com/file"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent_and_returns_body() {
        let app = Router::new().route(
            "/page",
            get(|headers: HeaderMap| async move {
                let agent = headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                format!("<p>agent={}</p>", agent)
            }),
        );
        let base = spawn_server(app).await;

        let fetcher = HttpFetcher::new(AGENT).unwrap();
        let page = fetcher.fetch(&format!("{}/page", base)).await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.body, format!("<p>agent={}</p>", AGENT));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let app = Router::new().route(
            "/gone",
            get(|| async { (StatusCode::NOT_FOUND, "missing") }),
        );
        let base = spawn_server(app).await;

        let fetcher = HttpFetcher::new(AGENT).unwrap();
        let err = fetcher.fetch(&format!("{}/gone", base)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_makes_no_call() {
        let fetcher = HttpFetcher::new(AGENT).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to get a port nobody is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new(AGENT).unwrap();
        let err = fetcher.fetch(&format!("http://{}/", addr)).await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }
}
