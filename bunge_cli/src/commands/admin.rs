//! The `admin` subcommand: operator actions checked against the shared key.

use std::path::PathBuf;

use anyhow::Result;
use bunge_lib::admin::{trigger_scrape, verify, ADMIN_KEY_ENV};
use bunge_lib::{Db, PageClient, ScrapeConfig, ScrapeRun};
use clap::{Args, Subcommand};

use crate::output::print_json;

#[derive(Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub action: AdminAction,
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// Check an admin key
    Verify {
        /// Admin key to check
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Scrape every member and update the database
    ScrapeMps {
        /// Admin key
        #[arg(long)]
        api_key: Option<String>,

        /// SQLite database path
        #[arg(long, default_value = "bunge.db")]
        db: PathBuf,
    },
}

pub async fn run(args: &AdminArgs, config: &ScrapeConfig) -> Result<()> {
    let expected = std::env::var(ADMIN_KEY_ENV).unwrap_or_default();

    match &args.action {
        AdminAction::Verify { api_key } => {
            let status = verify(api_key.as_deref(), &expected)?;
            print_json(&status);
        }
        AdminAction::ScrapeMps { api_key, db } => {
            verify(api_key.as_deref(), &expected)?;

            let client = PageClient::new(&config.client)?;
            let mut store = Db::open(db)?;
            store.init()?;
            let mut run = ScrapeRun::default();
            let summary = trigger_scrape(&client, config, &mut store, &mut run).await?;
            if !run.skipped.is_empty() {
                eprintln!("{} profiles skipped", run.skipped.len());
            }
            print_json(&summary);
        }
    }
    Ok(())
}
