use std::path::PathBuf;

use anyhow::Result;
use bunge_lib::aggregate::group_by_county;
use bunge_lib::Db;
use clap::Args;

use crate::output::{build_county_rows, build_mp_rows, print_rows, OutputFormat};

#[derive(Args)]
pub struct CountiesArgs {
    /// SQLite database path
    #[arg(long, default_value = "bunge.db")]
    pub db: PathBuf,

    /// Show the members of this county instead of the county counts
    #[arg(long)]
    pub county: Option<String>,
}

pub fn run(args: &CountiesArgs, format: &OutputFormat) -> Result<()> {
    let db = Db::open(&args.db)?;
    db.init()?;

    match args.county {
        Some(ref county) => {
            let mps = db.query_mps(Some(county.as_str()))?;
            if mps.is_empty() {
                eprintln!("No members stored for county '{}'", county);
            }
            print_rows(build_mp_rows(&mps), format)
        }
        None => {
            let mps = db.query_mps(None)?;
            print_rows(build_county_rows(&group_by_county(&mps)), format)
        }
    }
}
