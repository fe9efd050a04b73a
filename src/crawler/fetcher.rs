//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building HTTP clients with the browser-like request headers
//! - Pacing every outgoing request through the shared [`RequestPacer`]
//! - Retry logic for transient failures
//! - Error classification

use crate::config::UserAgentConfig;
use crate::crawler::RequestPacer;
use backon::{ExponentialBuilder, Retryable};
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code (always 200)
    pub status_code: u16,

    /// Page body content
    pub body: String,
}

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with anything other than HTTP 200
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The request never produced a response (connection, timeout, body read)
    #[error("Request to {url} failed: {message}")]
    Network {
        url: String,
        message: String,
        transient: bool,
    },
}

impl FetchError {
    /// Returns true if the same request may succeed when retried
    ///
    /// | Condition | Transient |
    /// |-----------|-----------|
    /// | HTTP 429 | yes |
    /// | HTTP 5xx | yes |
    /// | Other status | no |
    /// | Timeout / connection refused | yes |
    /// | Other network error | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Network { transient, .. } => *transient,
        }
    }
}

/// Builds an HTTP client sending the configured request headers
///
/// Every request carries the configured `User-Agent` plus `Cache-Control:
/// no-cache` and `Pragma: no-cache`.
///
/// # Example
///
/// ```no_run
/// use physician_indexer::config::UserAgentConfig;
/// use physician_indexer::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    Client::builder()
        .user_agent(config.value.as_str())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with pacing and bounded retries
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    pacer: Arc<RequestPacer>,
    backoff: ExponentialBuilder,
}

impl Fetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `client` - The HTTP client to use
    /// * `pacer` - Shared pacer enforcing the delay between requests
    /// * `max_retries` - Retries for transient failures
    pub fn new(client: Client, pacer: Arc<RequestPacer>, max_retries: u32) -> Self {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(10))
            .with_max_times(max_retries as usize)
            .with_jitter();

        Self {
            client,
            pacer,
            backoff,
        }
    }

    /// Replaces the retry policy
    pub fn with_backoff(mut self, backoff: ExponentialBuilder) -> Self {
        self.backoff = backoff;
        self
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// Each attempt, retries included, waits for the pacer first.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let attempt = move || self.fetch_once(url);

        attempt
            .retry(self.backoff.clone())
            .sleep(sleep)
            .when(FetchError::is_transient)
            .notify(|err: &FetchError, delay: Duration| {
                tracing::warn!(
                    url,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying page request"
                );
            })
            .await
    }

    /// Sends a single paced GET request
    async fn fetch_once(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.pacer.wait().await;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();

        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            body,
        })
    }
}

/// Maps a transport error to a [`FetchError`]
fn classify_error(url: &str, e: reqwest::Error) -> FetchError {
    let (message, transient) = if e.is_timeout() {
        ("Request timeout".to_string(), true)
    } else if e.is_connect() {
        ("Connection refused".to_string(), true)
    } else {
        (e.to_string(), false)
    };

    FetchError::Network {
        url: url.to_string(),
        message,
        transient,
    }
}
