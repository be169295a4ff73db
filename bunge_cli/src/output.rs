use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use bunge_lib::probe::FieldCoverage;
use bunge_lib::{CountyMember, MpRecord, WikiSummary};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    /// Unknown names fall back to a plain table.
    pub fn parse(name: &str) -> Self {
        match name {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            "markdown" | "md" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
pub struct MpRow {
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "County")]
    #[serde(rename = "County")]
    county: String,
    #[tabled(rename = "Constituency")]
    #[serde(rename = "Constituency")]
    constituency: String,
    #[tabled(rename = "Party")]
    #[serde(rename = "Party")]
    party: String,
    #[tabled(rename = "Email")]
    #[serde(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    #[serde(rename = "Phone")]
    phone: String,
}

#[derive(Tabled, Serialize)]
pub struct CountyRow {
    #[tabled(rename = "County")]
    #[serde(rename = "County")]
    county: String,
    #[tabled(rename = "Members")]
    #[serde(rename = "Members")]
    members: usize,
}

#[derive(Tabled, Serialize)]
pub struct CoverageRow {
    #[tabled(rename = "Field")]
    #[serde(rename = "Field")]
    field: String,
    #[tabled(rename = "Present")]
    #[serde(rename = "Present")]
    present: usize,
    #[tabled(rename = "Absent")]
    #[serde(rename = "Absent")]
    absent: usize,
    #[tabled(rename = "Coverage")]
    #[serde(rename = "Coverage")]
    coverage: String,
    #[tabled(rename = "Structure")]
    #[serde(rename = "Structure")]
    structure: String,
}

#[derive(Tabled, Serialize)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    #[serde(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
}

// -- Row builders --

pub fn build_mp_rows(mps: &[MpRecord]) -> Vec<MpRow> {
    mps.iter()
        .map(|mp| MpRow {
            name: mp.name.clone(),
            county: mp.county.clone().unwrap_or_default(),
            constituency: mp.constituency.clone().unwrap_or_default(),
            party: mp.party.clone().unwrap_or_default(),
            email: mp.email.clone().unwrap_or_default(),
            phone: mp.phone.clone().unwrap_or_default(),
        })
        .collect()
}

/// Largest counties first, then by name.
pub fn build_county_rows(by_county: &BTreeMap<String, Vec<CountyMember>>) -> Vec<CountyRow> {
    let mut rows: Vec<CountyRow> = by_county
        .iter()
        .map(|(county, members)| CountyRow {
            county: county.clone(),
            members: members.len(),
        })
        .collect();
    rows.sort_by(|a, b| b.members.cmp(&a.members).then_with(|| a.county.cmp(&b.county)));
    rows
}

pub fn build_coverage_rows(coverage: &BTreeMap<String, FieldCoverage>) -> Vec<CoverageRow> {
    coverage
        .iter()
        .map(|(field, cov)| CoverageRow {
            field: field.clone(),
            present: cov.present_count,
            absent: cov.absent_count,
            coverage: format!("{:.1}%", cov.coverage_pct),
            structure: cov
                .most_common_structure
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

pub fn build_wiki_rows(title: &str, summary: &WikiSummary) -> Vec<FieldRow> {
    let row = |field: &str, value: &str| FieldRow {
        field: field.to_string(),
        value: value.to_string(),
    };
    vec![
        row("Title", title),
        row("Description", summary.description.as_deref().unwrap_or("")),
        row("Extract", summary.extract.as_deref().unwrap_or("")),
        row("Thumbnail", summary.thumbnail_url.as_deref().unwrap_or("")),
        row("Page", &summary.page_url),
    ]
}

// -- Rendering --

pub fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => write_csv(std::io::stdout(), &rows)?,
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_json<T: Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// Writes `data` as pretty JSON to `path`, replacing any existing file.
pub fn write_json_file<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
