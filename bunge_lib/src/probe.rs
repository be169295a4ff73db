//! Read-only diagnostic run over the live site.
//!
//! The probe walks the listing to full depth, samples a handful of
//! profiles, and records which markup patterns are actually there: Drupal
//! field classes, cascade candidates, table shapes, photo sources and where
//! voting data might live. The report is for a human calibrating the field
//! parser; nothing reads it back at runtime.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use bunge_api::{Fetch, SiteUrls};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

use crate::aggregate::pct;
use crate::config::ScrapeConfig;
use crate::dom::{element_text, page_title, text_lines, text_nodes, ANCHOR, ANY, H1, IMG};
use crate::error::PipelineError;
use crate::profile::{inspect_markers, ProfilePage};
use crate::table::{classify, classify_and_extract, is_word_html, StructureClassification, TableData};
use crate::text::normalize_text;
use crate::types::ProfileLink;
use crate::walker::{walk, WalkOutcome};

pub const PROBE_VERSION: &str = "1.0";

/// Structured sections whose table layout gets a detailed breakdown.
pub const TABLE_FIELDS: [&str; 2] = [
    "field--name-field-education-background",
    "field--name-field-employment-history",
];

const FIELD_CLASS_PREFIX: &str = "field--name-";
const RAW_TEXT_LINES: usize = 10;
const VOTE_SNIPPETS: usize = 3;

static BILL_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Bill No\.|No\. \d{1,3} of 20\d{2}").expect("valid bill number regex")
});
static VOTE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bAyes?\b|\bNoes?\b|\babstain").expect("valid vote count regex")
});
static MP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Hon\.|Member for").expect("valid mp name regex"));
static PDF_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.pdf").expect("valid pdf regex"));
static DOWNLOAD_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)download|votes").expect("valid download regex"));
static VOTE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)vote|bill|hansard").expect("valid vote link regex"));
static PROFILE_VOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)vote|bill.*read|division|ayes|noes").expect("valid profile vote regex")
});
static VOTE_SNIPPET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i).{40}(?:vote|bill.*read|division).{40}").expect("valid snippet regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoSource {
    ListingThumbnail,
    ProfilePage,
    BothAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingLocation {
    FoundOnSeparatePage,
    NotFoundOnProfile,
    PotentiallyOnProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingVerdict {
    CheckManually,
    ProbablyNotPerMpData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnknownsResolved {
    pub total_mps: usize,
    pub photo_source: Option<PhotoSource>,
    pub voting_records_location: Option<VotingLocation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationStats {
    pub last_page_index: Option<u32>,
    pub total_pages: u32,
    pub per_page: usize,
    pub total_mp_links: usize,
    pub failed_pages: Vec<u32>,
    pub first_mp: Option<ProfileLink>,
    pub last_mp: Option<ProfileLink>,
}

impl PaginationStats {
    fn from_walk(walk: &WalkOutcome) -> Self {
        Self {
            last_page_index: walk.last_page_with_links,
            total_pages: walk.last_page_with_links.map(|p| p + 1).unwrap_or(0),
            per_page: walk.per_page,
            total_mp_links: walk.links.len(),
            failed_pages: walk.failed_pages.clone(),
            first_mp: walk.links.first().cloned(),
            last_mp: walk.links.last().cloned(),
        }
    }
}

/// Presence of one field class or cascade marker across the sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCoverage {
    pub present_count: usize,
    pub absent_count: usize,
    pub coverage_pct: f64,
    pub structure_types: BTreeMap<StructureClassification, usize>,
    pub most_common_structure: Option<StructureClassification>,
}

/// Breakdown of one structured section on one sampled profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableFieldAnalysis {
    pub present: bool,
    pub structure: Option<StructureClassification>,
    pub table: Option<TableData>,
    /// First lines of text when the section is not a table.
    pub raw_text_lines: Vec<String>,
}

impl TableFieldAnalysis {
    pub fn is_table(&self) -> bool {
        self.table.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSample {
    pub slug: String,
    pub name: Option<String>,
    pub has_tables: bool,
    pub fields: BTreeMap<String, TableFieldAnalysis>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VotingPageFinding {
    pub accessible: bool,
    pub reason: Option<String>,
    pub has_bill_numbers: bool,
    pub has_vote_counts: bool,
    pub has_mp_names: bool,
    pub has_pdf_links: bool,
    pub has_download_links: bool,
    pub vote_link_count: usize,
    pub page_title: String,
    pub recommendation: Option<VotingVerdict>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileVoteCheck {
    pub url: Option<String>,
    pub has_vote_field: bool,
    pub snippets: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VotingRecords {
    /// Keyed by probed path.
    pub pages: BTreeMap<String, VotingPageFinding>,
    pub sample_profile: ProfileVoteCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoFinding {
    pub slug: String,
    pub listing_photo: Option<String>,
    pub profile_photos: Vec<String>,
    pub has_listing_photo: bool,
    pub has_profile_photo: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoSourceReport {
    pub findings: Vec<PhotoFinding>,
    pub listing_photo_count: usize,
    pub profile_photo_count: usize,
    pub recommendation: Option<PhotoSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMpSample {
    pub slug: String,
    pub name: Option<String>,
    pub h1_text: Option<String>,
    pub fields_present: Vec<String>,
    /// Field classes whose markup looks pasted from a word processor.
    pub word_html_fields: Vec<String>,
}

/// Everything the probe learned. Filled in place as the run progresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    pub probe_timestamp: DateTime<Utc>,
    pub probe_version: String,
    pub base_url: String,
    pub profiles_sampled: usize,
    pub unknowns_resolved: UnknownsResolved,
    pub pagination: PaginationStats,
    pub field_coverage: BTreeMap<String, FieldCoverage>,
    pub table_analysis: Vec<TableSample>,
    pub voting_records: VotingRecords,
    pub photo_source: PhotoSourceReport,
    pub raw_mp_sample: Vec<RawMpSample>,
    pub recommendations: Vec<String>,
}

impl ProbeReport {
    pub fn new(base_url: &str) -> Self {
        Self {
            probe_timestamp: Utc::now(),
            probe_version: PROBE_VERSION.to_string(),
            base_url: base_url.to_string(),
            profiles_sampled: 0,
            unknowns_resolved: UnknownsResolved::default(),
            pagination: PaginationStats::default(),
            field_coverage: BTreeMap::new(),
            table_analysis: Vec::new(),
            voting_records: VotingRecords::default(),
            photo_source: PhotoSourceReport::default(),
            raw_mp_sample: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

/// Presence counts accumulated over the sample.
#[derive(Default)]
struct CoverageCounter {
    present: BTreeMap<String, usize>,
    structures: BTreeMap<String, BTreeMap<StructureClassification, usize>>,
}

impl CoverageCounter {
    fn record(&mut self, key: &str, structure: Option<StructureClassification>) {
        *self.present.entry(key.to_string()).or_default() += 1;
        let histogram = self.structures.entry(key.to_string()).or_default();
        if let Some(structure) = structure {
            *histogram.entry(structure).or_default() += 1;
        }
    }

    fn mark_seen(&mut self, key: &str) {
        self.present.entry(key.to_string()).or_default();
        self.structures.entry(key.to_string()).or_default();
    }

    fn finalize(&self, sampled: usize) -> BTreeMap<String, FieldCoverage> {
        self.present
            .iter()
            .map(|(key, &present)| {
                let structure_types = self.structures.get(key).cloned().unwrap_or_default();
                // Ties go to the earliest structure in precedence order.
                let most_common_structure = structure_types
                    .iter()
                    .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
                    .map(|(s, _)| *s);
                let coverage = FieldCoverage {
                    present_count: present,
                    absent_count: sampled.saturating_sub(present),
                    coverage_pct: pct(present, sampled),
                    structure_types,
                    most_common_structure,
                };
                (key.clone(), coverage)
            })
            .collect()
    }
}

/// One field class as seen on one profile.
struct FieldObservation {
    class: String,
    structure: StructureClassification,
    word_html: bool,
}

/// What one sampled profile page contains.
struct ProfileInventory {
    fields: Vec<FieldObservation>,
    markers: Vec<(String, bool)>,
    h1_text: Option<String>,
    profile_photos: Vec<String>,
}

fn inventory_profile(html: &str, urls: &SiteUrls) -> ProfileInventory {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let mut seen = BTreeSet::new();
    let mut fields = Vec::new();
    for el in root.select(&ANY) {
        let Some(class) = el
            .value()
            .classes()
            .find(|c| c.starts_with(FIELD_CLASS_PREFIX))
        else {
            continue;
        };
        if !seen.insert(class.to_string()) {
            continue;
        }
        fields.push(FieldObservation {
            class: class.to_string(),
            structure: classify(el),
            word_html: is_word_html(el),
        });
    }

    let page = ProfilePage { root, urls };
    ProfileInventory {
        fields,
        markers: inspect_markers(&page),
        h1_text: root.select(&H1).next().map(element_text),
        profile_photos: profile_photos(root, urls),
    }
}

/// Portrait-sized images, excluding inline data, logos and banners.
fn profile_photos(root: ElementRef<'_>, urls: &SiteUrls) -> Vec<String> {
    root.select(&IMG)
        .filter_map(|img| {
            let src = img.value().attr("src")?;
            let lower = src.to_lowercase();
            if lower.contains("base64") || lower.contains("logo") || lower.contains("banner") {
                return None;
            }
            ["mp_photo", "styles/medium", "styles/large"]
                .iter()
                .any(|marker| src.contains(marker))
                .then(|| urls.resolve(src).unwrap_or_else(|| src.to_string()))
        })
        .collect()
}

/// Detailed breakdown of the structured sections on one profile.
pub fn analyse_tables(html: &str) -> BTreeMap<String, TableFieldAnalysis> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    TABLE_FIELDS
        .iter()
        .map(|field| {
            let block = root
                .select(&ANY)
                .find(|el| el.value().classes().any(|c| c == *field));
            let analysis = match block {
                None => TableFieldAnalysis {
                    present: false,
                    structure: None,
                    table: None,
                    raw_text_lines: Vec::new(),
                },
                Some(block) => {
                    let (structure, table) = classify_and_extract(block);
                    let raw_text_lines = if table.is_none() {
                        text_lines(block).into_iter().take(RAW_TEXT_LINES).collect()
                    } else {
                        Vec::new()
                    };
                    TableFieldAnalysis {
                        present: true,
                        structure: Some(structure),
                        table,
                        raw_text_lines,
                    }
                }
            };
            (field.to_string(), analysis)
        })
        .collect()
}

fn page_text(root: ElementRef<'_>) -> String {
    normalize_text(&text_nodes(root).map(|(_, t)| t).collect::<Vec<_>>().join(" "))
}

/// Signals that a page carries voting data.
pub fn analyse_voting_page(html: &str) -> VotingPageFinding {
    let doc = Html::parse_document(html);
    let root = doc.root_element();
    let text = page_text(root);

    let hrefs: Vec<&str> = root
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .collect();
    let has_bill_numbers = BILL_NUMBER.is_match(&text);
    let has_vote_counts = VOTE_COUNT.is_match(&text);

    VotingPageFinding {
        accessible: true,
        reason: None,
        has_bill_numbers,
        has_vote_counts,
        has_mp_names: MP_NAME.is_match(&text),
        has_pdf_links: hrefs.iter().any(|h| PDF_LINK.is_match(h)),
        has_download_links: hrefs.iter().any(|h| DOWNLOAD_LINK.is_match(h)),
        vote_link_count: hrefs.iter().filter(|h| VOTE_LINK.is_match(h)).count(),
        page_title: page_title(root),
        recommendation: Some(if has_bill_numbers || has_vote_counts {
            VotingVerdict::CheckManually
        } else {
            VotingVerdict::ProbablyNotPerMpData
        }),
    }
}

fn check_profile_votes(url: &str, html: &str) -> ProfileVoteCheck {
    let doc = Html::parse_document(html);
    let text = page_text(doc.root_element());
    ProfileVoteCheck {
        url: Some(url.to_string()),
        has_vote_field: PROFILE_VOTE.is_match(&text),
        snippets: VOTE_SNIPPET
            .find_iter(&text)
            .take(VOTE_SNIPPETS)
            .map(|m| m.as_str().to_string())
            .collect(),
        error: None,
    }
}

fn photo_recommendation(listing: usize, profile: usize) -> PhotoSource {
    if listing > profile {
        PhotoSource::ListingThumbnail
    } else if profile > listing {
        PhotoSource::ProfilePage
    } else {
        PhotoSource::BothAvailable
    }
}

fn voting_location(voting: &VotingRecords) -> VotingLocation {
    let separate = voting
        .pages
        .values()
        .any(|p| p.accessible && (p.has_bill_numbers || p.has_vote_counts));
    if separate {
        VotingLocation::FoundOnSeparatePage
    } else if !voting.sample_profile.has_vote_field {
        VotingLocation::NotFoundOnProfile
    } else {
        VotingLocation::PotentiallyOnProfile
    }
}

/// Plain-language advice derived from a finished report.
pub fn recommendations(report: &ProbeReport) -> Vec<String> {
    let mut recs = Vec::new();

    let confirmed = |needle: &str| {
        report
            .field_coverage
            .iter()
            .find(|(key, cov)| {
                key.starts_with(FIELD_CLASS_PREFIX) && key.contains(needle) && cov.present_count > 0
            })
            .map(|(key, _)| key.clone())
    };

    match confirmed("party") {
        Some(field) => recs.push(format!("Party field confirmed: '{}'", field)),
        None => recs.push(
            "No explicit party field found; it may sit in the bio or page header. Check raw_mp_sample."
                .to_string(),
        ),
    }
    match confirmed("constituency") {
        Some(field) => recs.push(format!("Constituency field confirmed: '{}'", field)),
        None => recs.push(
            "No explicit constituency field; fall back to the heading text or breadcrumb."
                .to_string(),
        ),
    }

    match report.photo_source.recommendation {
        Some(PhotoSource::ListingThumbnail) => recs.push(
            "Photo: use the listing-page thumbnail captured during the listing walk.".to_string(),
        ),
        Some(PhotoSource::ProfilePage) => recs.push(
            "Photo: use the profile-page photo; add a dedicated selector to the photo cascade."
                .to_string(),
        ),
        Some(PhotoSource::BothAvailable) | None => recs.push(
            "Photo: listing and profile photos both available; prefer the profile photo for resolution."
                .to_string(),
        ),
    }

    match report.unknowns_resolved.voting_records_location {
        Some(VotingLocation::NotFoundOnProfile) => recs.push(
            "Voting: no per-member voting data found; leave voting records empty for now."
                .to_string(),
        ),
        Some(VotingLocation::FoundOnSeparatePage) => recs.push(
            "Voting: data lives in a separate section; it needs its own scraper.".to_string(),
        ),
        Some(VotingLocation::PotentiallyOnProfile) | None => recs.push(
            "Voting: inconclusive; check voting_records in the report manually.".to_string(),
        ),
    }

    let word_tables = report
        .table_analysis
        .iter()
        .flat_map(|sample| sample.fields.values())
        .filter(|field| field.table.as_ref().is_some_and(|t| t.artifacts.hits > 0))
        .count();
    if word_tables > 0 {
        recs.push(format!(
            "Tables: {} samples carry word-processor markup; strip inline styles before column detection.",
            word_tables
        ));
    }

    recs
}

/// Runs the full probe, writing results into `report` as they arrive.
pub async fn run_probe<F: Fetch>(
    fetcher: &F,
    config: &ScrapeConfig,
    report: &mut ProbeReport,
) -> Result<(), PipelineError> {
    let urls = config.site_urls()?;

    tracing::info!("probing pagination depth (up to {} pages)", config.run.max_pages);
    let mut outcome = WalkOutcome::default();
    walk(
        fetcher,
        &urls,
        &config.site.profile_path_marker,
        config.run.max_pages,
        &mut outcome,
    )
    .await;
    report.pagination = PaginationStats::from_walk(&outcome);
    report.unknowns_resolved.total_mps = outcome.links.len();
    tracing::info!("total unique profiles found: {}", outcome.links.len());

    let mut rng = match config.run.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sample: Vec<ProfileLink> = outcome
        .links
        .choose_multiple(&mut rng, config.run.sample_size.min(outcome.links.len()))
        .cloned()
        .collect();
    tracing::info!("sampling {} profiles", sample.len());

    let mut coverage = CoverageCounter::default();
    for (i, link) in sample.iter().enumerate() {
        report.profiles_sampled += 1;
        tracing::info!("  [{}/{}] {}", i + 1, sample.len(), link.url);

        let html = match fetcher.fetch(&link.url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("    skip: {}", e);
                report.field_coverage = coverage.finalize(report.profiles_sampled);
                continue;
            }
        };

        let inventory = inventory_profile(&html, &urls);
        for field in &inventory.fields {
            coverage.record(&field.class, Some(field.structure));
        }
        for (marker, present) in &inventory.markers {
            if *present {
                coverage.record(marker, None);
            } else {
                coverage.mark_seen(marker);
            }
        }
        report.field_coverage = coverage.finalize(report.profiles_sampled);

        let has_profile_photo = !inventory.profile_photos.is_empty();
        report.photo_source.findings.push(PhotoFinding {
            slug: link.slug.clone(),
            listing_photo: link.photo_url.clone(),
            profile_photos: inventory.profile_photos,
            has_listing_photo: link.photo_url.is_some(),
            has_profile_photo,
        });

        if report.table_analysis.len() < config.run.table_samples {
            let fields = analyse_tables(&html);
            report.table_analysis.push(TableSample {
                slug: link.slug.clone(),
                name: link.name.clone(),
                has_tables: fields.values().any(TableFieldAnalysis::is_table),
                fields,
            });
        }

        report.raw_mp_sample.push(RawMpSample {
            slug: link.slug.clone(),
            name: link.name.clone(),
            h1_text: inventory.h1_text,
            fields_present: inventory.fields.iter().map(|f| f.class.clone()).collect(),
            word_html_fields: inventory
                .fields
                .iter()
                .filter(|f| f.word_html)
                .map(|f| f.class.clone())
                .collect(),
        });
    }

    let findings = &report.photo_source.findings;
    let listing = findings.iter().filter(|f| f.has_listing_photo).count();
    let profile = findings.iter().filter(|f| f.has_profile_photo).count();
    let photo_source = photo_recommendation(listing, profile);
    report.photo_source.listing_photo_count = listing;
    report.photo_source.profile_photo_count = profile;
    report.photo_source.recommendation = Some(photo_source);
    report.unknowns_resolved.photo_source = Some(photo_source);

    tracing::info!("investigating voting record locations");
    report.voting_records.sample_profile = match outcome.links.first() {
        Some(first) => match fetcher.fetch(&first.url).await {
            Ok(html) => check_profile_votes(&first.url, &html),
            Err(e) => ProfileVoteCheck {
                url: Some(first.url.clone()),
                error: Some(e.to_string()),
                ..ProfileVoteCheck::default()
            },
        },
        None => ProfileVoteCheck {
            error: Some("no profile links found".to_string()),
            ..ProfileVoteCheck::default()
        },
    };

    for path in &config.site.voting_probe_paths {
        let Some(url) = urls.resolve(path) else {
            tracing::warn!("  cannot resolve voting path {}", path);
            continue;
        };
        tracing::info!("  checking {}", url);
        let finding = match fetcher.fetch(&url).await {
            Ok(html) => analyse_voting_page(&html),
            Err(e) => VotingPageFinding {
                reason: Some(format!("failed to load: {}", e)),
                ..VotingPageFinding::default()
            },
        };
        report.voting_records.pages.insert(path.clone(), finding);
    }
    report.unknowns_resolved.voting_records_location =
        Some(voting_location(&report.voting_records));

    report.recommendations = recommendations(report);
    Ok(())
}
