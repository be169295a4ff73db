//! Polite HTTP fetcher for the National Assembly website.
//!
//! Every request is paced, bounded by a timeout, and retried a fixed number
//! of times on transient failures. Callers receive either the page markup or
//! a typed [`FetchError`] they can log and skip.

mod client;
mod errors;
pub mod pacing;
pub mod urls;
mod user_agent;

pub use self::client::{ClientConfig, Fetch, PageClient};
pub use self::errors::FetchError;
pub use self::pacing::{RequestTracker, TrackerSummary};
pub use self::urls::{slug_from_url, SiteUrls};
