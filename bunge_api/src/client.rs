//! HTTP page client for the legislature website.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::FetchError;
use crate::pacing::{with_retry, Pacer, RequestTracker, RetryPolicy};
use crate::user_agent::get_user_agent;

/// Anything that can turn a URL into page markup.
///
/// [`PageClient`] is the production implementation; tests substitute an
/// in-memory map of fixtures.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>>;
}

/// Politeness, timeout and retry settings for [`PageClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Delay after every fetch, in milliseconds.
    pub delay_ms: u64,
    /// Random extra delay (0..=jitter_ms) added on top of `delay_ms`.
    pub jitter_ms: u64,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
    /// Total attempts per URL, including the first.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles for each further retry.
    pub retry_backoff_ms: u64,
    /// Fixed user agent. A desktop browser agent is picked when unset.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            jitter_ms: 0,
            timeout_secs: 30,
            max_attempts: 3,
            retry_backoff_ms: 500,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// No delays or backoff; for tests against a local mock server.
    pub fn immediate() -> Self {
        Self {
            delay_ms: 0,
            jitter_ms: 0,
            retry_backoff_ms: 0,
            timeout_secs: 5,
            ..Self::default()
        }
    }
}

/// Sequential, paced, retrying HTML fetcher.
pub struct PageClient {
    http: reqwest::Client,
    pacer: Pacer,
    retry: RetryPolicy,
    tracker: RequestTracker,
}

impl PageClient {
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| get_user_agent().to_string());
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Request {
                url: String::new(),
                source: e,
            })?;
        Ok(Self {
            http,
            pacer: Pacer::new(
                Duration::from_millis(config.delay_ms),
                Duration::from_millis(config.jitter_ms),
            ),
            retry: RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.retry_backoff_ms),
            ),
            tracker: RequestTracker::new(),
        })
    }

    /// Outcome counters for every request this client has made.
    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    async fn get_once(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .http
            .get(url)
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-US,en;q=0.9")
            .header("cache-control", "no-cache")
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}

impl Fetch for PageClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!("GET {}", url);
        let result = with_retry(&self.retry, &self.tracker, url, || self.get_once(url)).await;
        self.pacer.pause(&self.tracker).await;
        result
    }
}
