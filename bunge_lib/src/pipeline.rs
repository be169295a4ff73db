//! Full extraction run: listing walk, profile visits, grouping, and the
//! hand-off to storage.

use std::collections::BTreeMap;

use bunge_api::Fetch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{completeness, group_by_county, CompletenessStats};
use crate::config::ScrapeConfig;
use crate::db::{Db, DbError, UpsertCounts};
use crate::error::PipelineError;
use crate::profile::parse_profile;
use crate::types::{CountyMember, MpRecord};
use crate::walker::{walk, WalkOutcome};

/// A profile that produced no record, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedProfile {
    pub url: String,
    pub reason: String,
}

/// Everything a run has produced so far. Filled in place so an interrupted
/// run can still be written out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeRun {
    pub walk: WalkOutcome,
    pub records: Vec<MpRecord>,
    pub skipped: Vec<SkippedProfile>,
}

impl ScrapeRun {
    pub fn output(&self, scraped_at: DateTime<Utc>) -> ScrapeOutput {
        ScrapeOutput::new(self.records.clone(), scraped_at)
    }
}

/// The document written at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutput {
    pub scraped_at: DateTime<Utc>,
    pub total_mps: usize,
    pub mps: Vec<MpRecord>,
    pub by_county: BTreeMap<String, Vec<CountyMember>>,
    pub stats: CompletenessStats,
}

impl ScrapeOutput {
    pub fn new(mps: Vec<MpRecord>, scraped_at: DateTime<Utc>) -> Self {
        let by_county = group_by_county(&mps);
        let stats = completeness(&mps, &by_county);
        Self {
            scraped_at,
            total_mps: mps.len(),
            mps,
            by_county,
            stats,
        }
    }
}

/// Walks the listing, then visits every discovered profile in order.
///
/// Fetch and parse failures on individual profiles are logged and recorded
/// in `run.skipped`; the batch carries on. The run fails only when it ends
/// with no records at all.
pub async fn run_scrape<F: Fetch>(
    fetcher: &F,
    config: &ScrapeConfig,
    run: &mut ScrapeRun,
) -> Result<(), PipelineError> {
    let urls = config.site_urls()?;

    walk(
        fetcher,
        &urls,
        &config.site.profile_path_marker,
        config.run.max_pages,
        &mut run.walk,
    )
    .await;
    tracing::info!(
        "found {} profiles across {} listing pages ({} failed)",
        run.walk.links.len(),
        run.walk.pages_visited,
        run.walk.failed_pages.len()
    );

    let links = run.walk.links.clone();
    let total = links.len();
    for (idx, link) in links.into_iter().enumerate() {
        let html = match fetcher.fetch(&link.url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("[{}/{}] skipping {}: {}", idx + 1, total, link.url, e);
                run.skipped.push(SkippedProfile {
                    url: link.url,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match parse_profile(&html, &link, &urls, &config.extract) {
            Ok(record) => {
                tracing::info!(
                    "[{}/{}] {} - {}, {}",
                    idx + 1,
                    total,
                    record.name,
                    record.constituency.as_deref().unwrap_or("?"),
                    record.county.as_deref().unwrap_or("?")
                );
                run.records.push(record);
            }
            Err(e) => {
                tracing::warn!("[{}/{}] skipping: {}", idx + 1, total, e);
                run.skipped.push(SkippedProfile {
                    url: link.url,
                    reason: e.to_string(),
                });
            }
        }
    }

    if run.records.is_empty() {
        return Err(PipelineError::NoRecords {
            links_found: total,
            skipped: run.skipped.len(),
        });
    }
    tracing::info!(
        "scraped {} profiles, skipped {}",
        run.records.len(),
        run.skipped.len()
    );
    Ok(())
}

/// What [`persist`] wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistReport {
    pub mps: UpsertCounts,
    pub counties_updated: usize,
}

/// Upserts every member in one batch, then refreshes the membership lists of
/// the counties already stored.
pub fn persist(db: &mut Db, output: &ScrapeOutput) -> Result<PersistReport, DbError> {
    let mps = db.upsert_mps(&output.mps)?;
    let counties_updated = db.update_county_members(&output.by_county)?;
    db.set_meta("last_scrape_at", &output.scraped_at.to_rfc3339())?;
    Ok(PersistReport {
        mps,
        counties_updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{listing_html, profile_html, FixtureFetcher};
    use crate::types::ProfileLink;

    const BASE: &str = "https://www.parliament.go.ke";

    fn profile_url(slug: &str) -> String {
        format!("{}/the-national-assembly/{}", BASE, slug)
    }

    fn link(slug: &str) -> ProfileLink {
        ProfileLink {
            slug: slug.to_string(),
            url: profile_url(slug),
            name: None,
            photo_url: None,
        }
    }

    fn config() -> ScrapeConfig {
        ScrapeConfig::for_base_url(BASE)
    }

    #[tokio::test]
    async fn skips_bad_profiles_and_keeps_going() {
        let cfg = config();
        let urls = cfg.site_urls().unwrap();
        let fetcher = FixtureFetcher::new()
            .page(urls.listing_page(0), listing_html(&["hon-a", "hon-b", "hon-c", "hon-d"]))
            .page(urls.listing_page(1), listing_html(&[]))
            .page(profile_url("hon-a"), profile_html("Hon. A One", Some("Nairobi")))
            .page(profile_url("hon-b"), "<html><body><p>No heading</p></body></html>")
            .failing(profile_url("hon-c"))
            .page(profile_url("hon-d"), profile_html("Hon. D Four", None));

        let mut run = ScrapeRun::default();
        run_scrape(&fetcher, &cfg, &mut run).await.unwrap();

        assert_eq!(run.records.len(), 2);
        assert_eq!(run.skipped.len(), 2);
        assert_eq!(run.records[0].slug, "hon-a");
        assert_eq!(run.records[0].county.as_deref(), Some("Nairobi"));
        // Listing thumbnail fills in for a profile without a photo.
        assert_eq!(
            run.records[1].photo_url.as_deref(),
            Some("https://www.parliament.go.ke/files/hon-d.jpg")
        );
        assert!(run.skipped[0].reason.contains("no heading"));
    }

    #[tokio::test]
    async fn zero_records_is_a_batch_failure() {
        let cfg = config();
        let urls = cfg.site_urls().unwrap();
        let fetcher = FixtureFetcher::new()
            .page(urls.listing_page(0), listing_html(&["hon-a"]))
            .page(urls.listing_page(1), listing_html(&[]))
            .page(profile_url("hon-a"), "<html></html>");

        let mut run = ScrapeRun::default();
        let err = run_scrape(&fetcher, &cfg, &mut run).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NoRecords {
                links_found: 1,
                skipped: 1
            }
        ));
    }

    #[tokio::test]
    async fn unreachable_site_is_a_batch_failure() {
        let mut cfg = config();
        cfg.run.max_pages = 2;
        let fetcher = FixtureFetcher::new();

        let mut run = ScrapeRun::default();
        let err = run_scrape(&fetcher, &cfg, &mut run).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoRecords { links_found: 0, .. }));
        assert_eq!(run.walk.failed_pages, vec![0, 1]);
    }

    #[test]
    fn output_groups_and_counts() {
        let records = vec![
            parse_profile(
                &profile_html("Hon. A", Some("Kisumu")),
                &link("hon-a"),
                &config().site_urls().unwrap(),
                &Default::default(),
            )
            .unwrap(),
            parse_profile(
                &profile_html("Hon. B", None),
                &link("hon-b"),
                &config().site_urls().unwrap(),
                &Default::default(),
            )
            .unwrap(),
        ];
        let output = ScrapeOutput::new(records, Utc::now());
        assert_eq!(output.total_mps, 2);
        assert_eq!(output.by_county.len(), 2);
        assert!(output.by_county.contains_key("Unknown"));
        assert_eq!(output.stats.total, 2);
    }

    #[test]
    fn persist_writes_batch_and_counties() {
        let mut db = Db::open_in_memory().unwrap();
        db.init().unwrap();
        db.insert_county("Kisumu").unwrap();

        let record = parse_profile(
            &profile_html("Hon. A", Some("Kisumu")),
            &link("hon-a"),
            &config().site_urls().unwrap(),
            &Default::default(),
        )
        .unwrap();
        let output = ScrapeOutput::new(vec![record], Utc::now());

        let report = persist(&mut db, &output).unwrap();
        assert_eq!(report.mps.inserted, 1);
        assert_eq!(report.counties_updated, 1);
        assert!(db.get_meta("last_scrape_at").unwrap().is_some());
    }
}
