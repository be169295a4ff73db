//! URL helpers for the legislature site: listing pagination, absolute-URL
//! resolution and profile slugs.

use url::Url;

use crate::errors::FetchError;

/// Resolved base and listing URLs for one site.
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base: Url,
    listing: Url,
    page_param: String,
}

impl SiteUrls {
    pub fn new(base_url: &str, listing_path: &str, page_param: &str) -> Result<Self, FetchError> {
        let base = Url::parse(base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let listing = base
            .join(listing_path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", listing_path, e)))?;
        Ok(Self {
            base,
            listing,
            page_param: page_param.to_string(),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn listing(&self) -> &Url {
        &self.listing
    }

    /// URL of listing page `page`. Page 0 is the bare listing URL; later
    /// pages carry the page-index query parameter.
    pub fn listing_page(&self, page: u32) -> String {
        if page == 0 {
            return self.listing.to_string();
        }
        let mut url = self.listing.clone();
        url.query_pairs_mut()
            .append_pair(&self.page_param, &page.to_string());
        url.to_string()
    }

    /// Resolves an `href`/`src` attribute against the site base.
    ///
    /// Returns `None` for empty values, inline `data:` URIs, and anything
    /// that does not resolve to an http(s) URL.
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with("data:") {
            return None;
        }
        let url = self.base.join(href).ok()?;
        match url.scheme() {
            "http" | "https" => Some(url.to_string()),
            _ => None,
        }
    }
}

/// Stable identifier for a profile: the last non-empty path segment.
pub fn slug_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(|segment| segment.to_string())
}
