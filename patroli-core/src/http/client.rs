//! HTTP client trait and implementations.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Product pages sniff for crawlers; present ordinary browser headers.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Trait for HTTP clients, enabling mockability in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch a page as decoded HTML text.
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

/// Configuration for [`WebClient`].
#[derive(Clone)]
pub struct WebClientBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for WebClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebClientBuilder {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: USER_AGENT.to_string(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn build(self) -> Result<WebClient, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;

        Ok(WebClient { inner })
    }
}

/// Production HTTP client.
pub struct WebClient {
    inner: reqwest::Client,
}

impl WebClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        WebClientBuilder::new().build()
    }

    pub fn builder() -> WebClientBuilder {
        WebClientBuilder::new()
    }
}

#[async_trait]
impl HttpClient for WebClient {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        tracing::debug!(url, "network: fetching page");
        let response = self
            .inner
            .get(parsed)
            .header("Accept", ACCEPT)
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!(url, status = %response.status(), "network: request failed");
            return Err(FetchError::RequestFailed(
                response.error_for_status().unwrap_err(),
            ));
        }

        Ok(response.text().await?)
    }
}

/// Mock HTTP client for testing, keyed by exact URL.
#[derive(Default)]
pub struct MockClient {
    responses: HashMap<String, Result<String, String>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an HTML response for a URL.
    pub fn with_html(mut self, url: &str, html: &str) -> Self {
        self.responses
            .insert(url.to_string(), Ok(html.to_string()));
        self
    }

    /// Add an error response for a URL.
    pub fn with_error(mut self, url: &str, error: &str) -> Self {
        self.responses
            .insert(url.to_string(), Err(error.to_string()));
        self
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        match self.responses.get(url) {
            Some(Ok(html)) => Ok(html.clone()),
            Some(Err(e)) => Err(FetchError::InvalidUrl(e.clone())),
            None => Err(FetchError::InvalidUrl(format!(
                "No mock response for URL: {}",
                url
            ))),
        }
    }
}
