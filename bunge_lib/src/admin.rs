//! Shared-secret gated entry points for operators.

use bunge_api::Fetch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ScrapeConfig;
use crate::db::{Db, DbError};
use crate::error::PipelineError;
use crate::pipeline::{persist, run_scrape, ScrapeRun};

/// Environment variable holding the operator key.
pub const ADMIN_KEY_ENV: &str = "BUNGE_ADMIN_KEY";

#[derive(thiserror::Error, Debug)]
pub enum AdminError {
    #[error("invalid or missing admin key")]
    Unauthorized,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Db(#[from] DbError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStatus {
    pub status: String,
    pub role: String,
}

/// Result of a successful triggered scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeSummary {
    pub status: String,
    pub message: String,
    pub total_mps: usize,
    pub counties: usize,
    pub scraped_at: DateTime<Utc>,
}

/// Checks `provided` against `expected`. An unset (empty) expected key
/// rejects everyone.
pub fn authorize(provided: Option<&str>, expected: &str) -> Result<(), AdminError> {
    match provided {
        Some(key) if !expected.is_empty() && key == expected => Ok(()),
        _ => Err(AdminError::Unauthorized),
    }
}

pub fn verify(provided: Option<&str>, expected: &str) -> Result<AdminStatus, AdminError> {
    authorize(provided, expected)?;
    Ok(AdminStatus {
        status: "authorized".to_string(),
        role: "admin".to_string(),
    })
}

/// Runs the whole pipeline and commits the batch.
///
/// Individual profile failures are absorbed by the run; only a run that
/// produced no records at all comes back as an error.
pub async fn trigger_scrape<F: Fetch>(
    fetcher: &F,
    config: &ScrapeConfig,
    db: &mut Db,
    run: &mut ScrapeRun,
) -> Result<ScrapeSummary, AdminError> {
    run_scrape(fetcher, config, run).await?;

    let output = run.output(Utc::now());
    let report = persist(db, &output)?;
    tracing::info!(
        "stored {} new and {} updated members, {} counties refreshed",
        report.mps.inserted,
        report.mps.updated,
        report.counties_updated
    );

    Ok(ScrapeSummary {
        status: "success".to_string(),
        message: "MPs scraped and database updated".to_string(),
        total_mps: output.total_mps,
        counties: output.by_county.len(),
        scraped_at: output.scraped_at,
    })
}
