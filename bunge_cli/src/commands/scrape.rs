//! The `scrape` subcommand: full run over every member profile.

use std::path::PathBuf;

use anyhow::{bail, Result};
use bunge_lib::pipeline::{persist, run_scrape};
use bunge_lib::{Db, PageClient, ScrapeConfig, ScrapeRun};
use chrono::Utc;
use clap::Args;

use crate::output::{build_county_rows, build_mp_rows, print_rows, write_json_file, OutputFormat};

#[derive(Args)]
pub struct ScrapeArgs {
    /// Where to write the run document
    #[arg(long, default_value = "mps_complete.json")]
    pub out: PathBuf,

    /// SQLite database to upsert the batch into
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Override the listing page cap
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Print every member instead of the per-county counts
    #[arg(long)]
    pub members: bool,
}

pub async fn run(args: &ScrapeArgs, config: &ScrapeConfig, format: &OutputFormat) -> Result<()> {
    let mut config = config.clone();
    if let Some(max_pages) = args.max_pages {
        config.run.max_pages = max_pages.max(1);
    }

    let client = PageClient::new(&config.client)?;
    let mut run = ScrapeRun::default();
    eprintln!("Scraping {} (up to {} listing pages)", config.site.base_url, config.run.max_pages);

    let result = tokio::select! {
        res = run_scrape(&client, &config, &mut run) => Some(res),
        _ = tokio::signal::ctrl_c() => None,
    };

    let output = run.output(Utc::now());
    let Some(result) = result else {
        write_json_file(&args.out, &output)?;
        eprintln!(
            "Interrupted: wrote {} partial records to {}",
            output.total_mps,
            args.out.display()
        );
        bail!("scrape interrupted");
    };
    result?;

    write_json_file(&args.out, &output)?;
    eprintln!(
        "Scraped {} members ({} skipped) into {}",
        output.total_mps,
        run.skipped.len(),
        args.out.display()
    );

    if let Some(ref path) = args.db {
        let mut db = Db::open(path)?;
        db.init()?;
        let report = persist(&mut db, &output)?;
        eprintln!(
            "Database {}: {} inserted, {} updated, {} counties refreshed",
            path.display(),
            report.mps.inserted,
            report.mps.updated,
            report.counties_updated
        );
    }

    let stats = &output.stats;
    eprintln!(
        "Completeness: email {:.1}%, phone {:.1}%, photo {:.1}%, county {:.1}%",
        stats.email_pct, stats.phone_pct, stats.photo_pct, stats.county_pct
    );
    let requests = client.tracker().summary();
    eprintln!(
        "Requests: {} ok, {} retries, {} failed",
        requests.requests_succeeded, requests.requests_retried, requests.requests_failed
    );

    if args.members {
        print_rows(build_mp_rows(&output.mps), format)
    } else {
        print_rows(build_county_rows(&output.by_county), format)
    }
}
