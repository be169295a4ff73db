//! CLI subcommand implementations.

pub mod admin;
pub mod counties;
pub mod probe;
pub mod scrape;
pub mod wiki;
