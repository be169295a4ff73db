//! Error types for the extraction pipeline.

use bunge_api::FetchError;

use crate::db::DbError;

/// A profile page that cannot be turned into a record.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No usable `<h1>` heading, so there is no name to identify the member.
    #[error("no heading found on profile {url}")]
    MissingHeading { url: String },
}

/// Failures that abort a whole pipeline run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Every profile failed or no profile links were found at all.
    #[error("no usable records: {links_found} profile links found, {skipped} profiles skipped")]
    NoRecords { links_found: usize, skipped: usize },
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("database error: {0}")]
    Db(#[from] DbError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Problems loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}
