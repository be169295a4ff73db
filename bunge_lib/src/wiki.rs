//! Encyclopedia summary lookups for member articles, cached in memory.

use std::time::Duration;

use bunge_api::FetchError;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::MemoryCache;
use crate::config::WikiConfig;
use crate::text::truncate_chars;

const ARTICLE_BASE: &str = "https://en.wikipedia.org/wiki/";

/// What the CLI shows for a member's article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiSummary {
    pub extract: Option<String>,
    pub thumbnail_url: Option<String>,
    pub page_url: String,
    pub description: Option<String>,
}

impl WikiSummary {
    /// Placeholder pointing at the article page when the summary endpoint
    /// could not be used.
    fn fallback(title: &str, description: Option<String>) -> Self {
        Self {
            extract: None,
            thumbnail_url: None,
            page_url: format!("{}{}", ARTICLE_BASE, title.replace(' ', "_")),
            description,
        }
    }
}

#[derive(Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    thumbnail: Option<Thumbnail>,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct Thumbnail {
    source: String,
}

#[derive(Deserialize)]
struct ContentUrls {
    #[serde(default)]
    mobile: Option<PageUrl>,
    #[serde(default)]
    desktop: Option<PageUrl>,
}

#[derive(Deserialize)]
struct PageUrl {
    page: String,
}

enum LookupError {
    /// Transport failure or non-success status.
    Network(reqwest::Error),
    /// Anything else, such as an unreadable body.
    Other(String),
}

/// Summary client with a bounded TTL cache in front of the REST endpoint.
pub struct WikiClient {
    http: reqwest::Client,
    base_url: Url,
    cache: MemoryCache<WikiSummary>,
    max_chars: usize,
}

impl WikiClient {
    pub fn new(config: &WikiConfig, summary_max_chars: usize) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Request {
                url: config.base_url.clone(),
                source: e,
            })?;
        Ok(Self {
            http,
            base_url,
            cache: MemoryCache::new(
                Duration::from_secs(config.cache_ttl_secs),
                config.cache_capacity,
            ),
            max_chars: summary_max_chars,
        })
    }

    /// Summary for `title`. Never fails: when the endpoint cannot be used a
    /// fallback pointing at the article page is returned (and not cached).
    pub async fn summary(&self, title: &str) -> WikiSummary {
        let key = format!("wiki_{}", title);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!("wiki cache hit: {}", title);
            return hit;
        }

        match self.lookup(title).await {
            Ok(summary) => {
                self.cache.set(key, summary.clone());
                summary
            }
            Err(LookupError::Network(e)) => {
                tracing::warn!("wiki summary for {} unavailable: {}", title, e);
                WikiSummary::fallback(title, Some(format!("Wikipedia article for {}", title)))
            }
            Err(LookupError::Other(e)) => {
                tracing::warn!("wiki summary for {} unreadable: {}", title, e);
                WikiSummary::fallback(title, None)
            }
        }
    }

    fn summary_url(&self, title: &str) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::Other(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push("page")
            .push("summary")
            .push(&title.replace(' ', "_"));
        Ok(url)
    }

    async fn lookup(&self, title: &str) -> Result<WikiSummary, LookupError> {
        let url = self.summary_url(title)?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(LookupError::Network)?;
        let body = resp.text().await.map_err(LookupError::Network)?;
        let data: SummaryResponse =
            serde_json::from_str(&body).map_err(|e| LookupError::Other(e.to_string()))?;

        let page_url = data
            .content_urls
            .and_then(|urls| urls.mobile.or(urls.desktop))
            .map(|p| p.page)
            .unwrap_or_else(|| format!("{}{}", ARTICLE_BASE, title.replace(' ', "_")));

        Ok(WikiSummary {
            extract: data
                .extract
                .filter(|e| !e.is_empty())
                .map(|e| truncate_chars(&e, self.max_chars)),
            thumbnail_url: data.thumbnail.map(|t| t.source),
            page_url,
            description: data.description,
        })
    }
}
