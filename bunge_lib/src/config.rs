//! Run configuration: site layout, politeness, extraction bounds and probe
//! sampling, passed explicitly into each component.

use std::path::Path;

use bunge_api::{ClientConfig, SiteUrls};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration. Every field has a default, so an empty TOML
/// document is a valid config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub site: SiteConfig,
    pub client: ClientConfig,
    pub extract: ExtractConfig,
    pub run: RunConfig,
    pub wiki: WikiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub listing_path: String,
    /// Path fragment every member profile URL contains.
    pub profile_path_marker: String,
    /// Query parameter carrying the listing page index.
    pub page_param: String,
    /// Pages the probe inspects for voting-record data.
    pub voting_probe_paths: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.parliament.go.ke".to_string(),
            listing_path: "/the-national-assembly/mps".to_string(),
            profile_path_marker: "/the-national-assembly/hon-".to_string(),
            page_param: "page".to_string(),
            voting_probe_paths: vec![
                "/the-national-assembly/votes-and-proceedings".to_string(),
                "/the-national-assembly/hansard".to_string(),
                "/the-national-assembly/bills".to_string(),
                "/the-national-assembly/committee-business".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub bio_max_chars: usize,
    pub summary_max_chars: usize,
    /// Word-processor artifact hits above which a table is read as plain text.
    pub artifact_degrade_threshold: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            bio_max_chars: 500,
            summary_max_chars: 800,
            artifact_degrade_threshold: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub max_pages: u32,
    pub sample_size: usize,
    /// How many sampled profiles get a full table-structure breakdown.
    pub table_samples: usize,
    /// Fixed seed for probe sampling; random when unset.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_pages: 35,
            sample_size: 10,
            table_samples: 5,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    pub base_url: String,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub timeout_secs: u64,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org/api/rest_v1".to_string(),
            cache_ttl_secs: 24 * 60 * 60,
            cache_capacity: 512,
            timeout_secs: 5,
        }
    }
}

impl ScrapeConfig {
    /// Loads `path` if given (defaults otherwise), applies `.env` and
    /// environment overrides, then validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("BUNGE_BASE_URL") {
            if !base_url.is_empty() {
                self.site.base_url = base_url;
            }
        }
        self.client.delay_ms = env_u64("BUNGE_DELAY_MS", self.client.delay_ms);
        self.run.max_pages = env_u64("BUNGE_MAX_PAGES", u64::from(self.run.max_pages))
            .try_into()
            .unwrap_or(self.run.max_pages);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.max_pages == 0 {
            return Err(ConfigError::Invalid {
                key: "run.max_pages",
                message: "must be at least 1".to_string(),
            });
        }
        if self.client.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "client.max_attempts",
                message: "must be at least 1".to_string(),
            });
        }
        if self.site.profile_path_marker.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "site.profile_path_marker",
                message: "must not be empty".to_string(),
            });
        }
        self.site_urls()?;
        Ok(())
    }

    /// Parsed base and listing URLs.
    pub fn site_urls(&self) -> Result<SiteUrls, ConfigError> {
        SiteUrls::new(
            &self.site.base_url,
            &self.site.listing_path,
            &self.site.page_param,
        )
        .map_err(|e| ConfigError::Invalid {
            key: "site.base_url",
            message: e.to_string(),
        })
    }

    /// A config pointed at `base_url` with every delay removed; for tests
    /// against a local mock server.
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            site: SiteConfig {
                base_url: base_url.to_string(),
                ..SiteConfig::default()
            },
            client: ClientConfig::immediate(),
            ..Self::default()
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ScrapeConfig::from_toml("").unwrap();
        assert_eq!(config.run.max_pages, 35);
        assert_eq!(config.run.sample_size, 10);
        assert_eq!(config.extract.bio_max_chars, 500);
        assert_eq!(config.extract.summary_max_chars, 800);
        assert_eq!(config.client.max_attempts, 3);
        assert_eq!(config.site.base_url, "https://www.parliament.go.ke");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ScrapeConfig::from_toml(
            r#"
            [client]
            delay_ms = 2000
            jitter_ms = 500

            [run]
            sample_size = 4
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.client.delay_ms, 2000);
        assert_eq!(config.client.jitter_ms, 500);
        assert_eq!(config.client.timeout_secs, 30);
        assert_eq!(config.run.sample_size, 4);
        assert_eq!(config.run.seed, Some(42));
        assert_eq!(config.run.max_pages, 35);
    }

    #[test]
    fn rejects_zero_pages() {
        let config = ScrapeConfig::from_toml("[run]\nmax_pages = 0").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "run.max_pages", .. })
        ));
    }

    #[test]
    fn rejects_bad_base_url() {
        let config = ScrapeConfig::from_toml("[site]\nbase_url = \"nope\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            ScrapeConfig::from_toml("[run\nmax_pages = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_config_has_no_delays() {
        let config = ScrapeConfig::for_base_url("http://127.0.0.1:1234");
        assert_eq!(config.client.delay_ms, 0);
        assert_eq!(config.client.retry_backoff_ms, 0);
        assert!(config.validate().is_ok());
    }
}
