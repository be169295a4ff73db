mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use bunge_lib::ScrapeConfig;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "bunge")]
#[command(about = "Scrape and explore National Assembly member profiles")]
struct Cli {
    /// Output format: table, json, csv or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// TOML config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every member profile and write the run document
    Scrape(commands::scrape::ScrapeArgs),
    /// Survey the site markup without storing anything
    Probe(commands::probe::ProbeArgs),
    /// List counties or the members of one county from the database
    Counties(commands::counties::CountiesArgs),
    /// Operator actions gated by the admin key
    Admin(commands::admin::AdminArgs),
    /// Look up the encyclopedia summary for a member
    Wiki(commands::wiki::WikiArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bunge=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);
    let config = ScrapeConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Scrape(args) => commands::scrape::run(args, &config, &format).await?,
        Commands::Probe(args) => commands::probe::run(args, &config, &format).await?,
        Commands::Counties(args) => commands::counties::run(args, &format)?,
        Commands::Admin(args) => commands::admin::run(args, &config).await?,
        Commands::Wiki(args) => commands::wiki::run(args, &config, &format).await?,
    }

    Ok(())
}
