//! In-memory page source for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use bunge_api::{Fetch, FetchError};

/// Serves fixed markup per URL. Unknown URLs answer 404; URLs marked as
/// failing time out.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    requested: RefCell<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn failing(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl Fetch for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requested.borrow_mut().push(url.to_string());
        if self.failing.contains(url) {
            return Err(FetchError::Timeout {
                url: url.to_string(),
            });
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
    }
}

/// A listing page linking to each of `slugs`.
pub fn listing_html(slugs: &[&str]) -> String {
    let anchors: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<div class="mp"><a href="/the-national-assembly/{slug}"><img src="/files/{slug}.jpg" alt="{slug}"></a></div>"#
            )
        })
        .collect();
    format!("<html><body><div class=\"view-content\">{anchors}</div></body></html>")
}

/// A minimal profile page with a heading and a county field.
pub fn profile_html(name: &str, county: Option<&str>) -> String {
    let county = county
        .map(|c| {
            format!(
                r#"<div class="field field--name-field-county"><div class="field__label">County</div><div class="field__item">{c}</div></div>"#
            )
        })
        .unwrap_or_default();
    format!("<html><body><h1 class=\"page-title\">{name}</h1>{county}</body></html>")
}
