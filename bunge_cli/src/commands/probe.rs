//! The `probe` subcommand: read-only survey of the site markup.

use std::path::PathBuf;

use anyhow::{bail, Result};
use bunge_lib::probe::run_probe;
use bunge_lib::{PageClient, ProbeReport, ScrapeConfig};
use clap::Args;

use crate::output::{build_coverage_rows, print_rows, write_json_file, OutputFormat};

#[derive(Args)]
pub struct ProbeArgs {
    /// Where to write the probe report
    #[arg(long, default_value = "probe_report.json")]
    pub out: PathBuf,

    /// Number of profiles to sample
    #[arg(long)]
    pub sample_size: Option<usize>,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the listing page cap
    #[arg(long)]
    pub max_pages: Option<u32>,
}

pub async fn run(args: &ProbeArgs, config: &ScrapeConfig, format: &OutputFormat) -> Result<()> {
    let mut config = config.clone();
    if let Some(n) = args.sample_size {
        config.run.sample_size = n;
    }
    if args.seed.is_some() {
        config.run.seed = args.seed;
    }
    if let Some(max_pages) = args.max_pages {
        config.run.max_pages = max_pages.max(1);
    }

    let client = PageClient::new(&config.client)?;
    let mut report = ProbeReport::new(&config.site.base_url);
    eprintln!("Probing {}", config.site.base_url);

    let result = tokio::select! {
        res = run_probe(&client, &config, &mut report) => Some(res),
        _ = tokio::signal::ctrl_c() => None,
    };

    let Some(result) = result else {
        write_json_file(&args.out, &report)?;
        eprintln!("Interrupted: partial report written to {}", args.out.display());
        bail!("probe interrupted");
    };
    result?;

    write_json_file(&args.out, &report)?;
    eprintln!(
        "Probe complete: {} profile links, {} sampled, report at {}",
        report.pagination.total_mp_links,
        report.profiles_sampled,
        args.out.display()
    );
    for rec in &report.recommendations {
        eprintln!("  - {}", rec);
    }

    print_rows(build_coverage_rows(&report.field_coverage), format)
}
