//! Extraction core for National Assembly member profiles.
//!
//! Walks the paginated member listing, parses each profile through
//! ordered selector cascades, groups members by county, and persists the
//! batch to SQLite. Also hosts the read-only site probe, the operator
//! trigger, and a cached encyclopedia summary client.

pub mod admin;
pub mod aggregate;
pub mod cache;
pub mod config;
pub mod db;
pub(crate) mod dom;
pub mod error;
pub mod links;
pub mod pipeline;
pub mod probe;
pub mod profile;
pub mod table;
pub mod text;
pub mod types;
pub mod walker;
pub mod wiki;

#[cfg(test)]
pub(crate) mod testing;

pub use bunge_api;
pub use bunge_api::{ClientConfig, Fetch, FetchError, PageClient, SiteUrls};

pub use admin::{AdminError, AdminStatus, ScrapeSummary};
pub use aggregate::{CompletenessStats, CountyCount};
pub use cache::MemoryCache;
pub use config::ScrapeConfig;
pub use db::{Db, DbError, UpsertCounts};
pub use error::{ConfigError, ParseError, PipelineError};
pub use pipeline::{ScrapeOutput, ScrapeRun, SkippedProfile};
pub use probe::ProbeReport;
pub use table::StructureClassification;
pub use types::{CountyMember, MpRecord, ProfileLink};
pub use walker::WalkOutcome;
pub use wiki::{WikiClient, WikiSummary};
