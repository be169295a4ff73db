use anyhow::Result;
use bunge_lib::text::derive_wiki_title;
use bunge_lib::{ScrapeConfig, WikiClient};
use clap::Args;

use crate::output::{build_wiki_rows, print_json, print_rows, OutputFormat};

#[derive(Args)]
pub struct WikiArgs {
    /// Article title, or a member's display name with --name
    pub title: String,

    /// Treat the argument as a display name and derive the article title
    #[arg(long)]
    pub name: bool,
}

pub async fn run(args: &WikiArgs, config: &ScrapeConfig, format: &OutputFormat) -> Result<()> {
    let title = if args.name {
        derive_wiki_title(&args.title)
    } else {
        args.title.clone()
    };

    let client = WikiClient::new(&config.wiki, config.extract.summary_max_chars)?;
    let summary = client.summary(&title).await;

    match format {
        OutputFormat::Json => print_json(&summary),
        _ => print_rows(build_wiki_rows(&title, &summary), format)?,
    }
    Ok(())
}
