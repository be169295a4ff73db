//! Sequential walk over the paginated member listing.

use bunge_api::{Fetch, SiteUrls};
use serde::{Deserialize, Serialize};

use crate::links::extract_links;
use crate::types::ProfileLink;

/// What a listing walk has gathered so far.
///
/// The walk writes into a caller-owned value so that an interrupted run
/// still leaves every link collected up to that point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalkOutcome {
    /// Unique by slug, in discovery order.
    pub links: Vec<ProfileLink>,
    pub pages_visited: u32,
    /// Page indexes whose fetch failed after retries.
    pub failed_pages: Vec<u32>,
    pub last_page_with_links: Option<u32>,
    /// Links found on page 0.
    pub per_page: usize,
    /// First page that produced no new links, if the walk stopped early.
    pub end_page: Option<u32>,
}

impl WalkOutcome {
    /// Adds `found` to the collected links and returns how many were new.
    ///
    /// A slug seen before keeps its first URL and photo; a later sighting
    /// only fills in a name or photo the first one lacked.
    fn merge(&mut self, found: Vec<ProfileLink>) -> usize {
        let mut added = 0;
        for link in found {
            match self.links.iter_mut().find(|l| l.slug == link.slug) {
                Some(existing) => {
                    if existing.photo_url.is_none() {
                        existing.photo_url = link.photo_url;
                    }
                    if existing.name.is_none() {
                        existing.name = link.name;
                    }
                }
                None => {
                    self.links.push(link);
                    added += 1;
                }
            }
        }
        added
    }
}

/// Visits listing pages 0..`max_pages` in order.
///
/// Stops at the first successfully fetched page that adds no new links.
/// A page whose fetch fails is logged, recorded in `failed_pages`, and
/// skipped; the walk carries on up to the same page cap.
pub async fn walk<F: Fetch>(
    fetcher: &F,
    urls: &SiteUrls,
    profile_marker: &str,
    max_pages: u32,
    outcome: &mut WalkOutcome,
) {
    for page in 0..max_pages {
        let url = urls.listing_page(page);
        outcome.pages_visited += 1;

        let body = match fetcher.fetch(&url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("listing page {} failed, continuing: {}", page, e);
                outcome.failed_pages.push(page);
                continue;
            }
        };

        let found = extract_links(&body, urls, profile_marker);
        if page == 0 {
            outcome.per_page = found.len();
        }
        let total = found.len();
        let added = outcome.merge(found);

        if added == 0 {
            tracing::info!("listing page {}: no new profiles, stopping", page);
            outcome.end_page = Some(page);
            break;
        }
        tracing::info!(
            "listing page {}: {} links, {} new ({} total)",
            page,
            total,
            added,
            outcome.links.len()
        );
        outcome.last_page_with_links = Some(page);
    }
}
