//! Structure classification for profile content blocks, and row/column
//! extraction for the tabular ones.
//!
//! Education and employment sections are hand-edited, frequently pasted from
//! a word processor, and arrive as tables, lists, paragraphs or bare text
//! depending on who last touched the page. Classification picks the first
//! structural element found in precedence order: table, unordered list,
//! ordered list, paragraph, otherwise plain text. Stray `<li>` items with no
//! enclosing list count as an unordered list.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::dom::{element_text, selector, text_lines, LI};

static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static UL: LazyLock<Selector> = LazyLock::new(|| selector("ul"));
static OL: LazyLock<Selector> = LazyLock::new(|| selector("ol"));
static P: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static TR: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td, th"));
static STYLED_SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span[style]"));

/// Textual signatures of word-processor markup. Counted, never stripped.
static ARTIFACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"margin-left|font-family:[^;">]*Times|0in \d|border:solid"#)
        .expect("valid artifact regex")
});

static WORD_HTML: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"font-family:[^;">]*Times|margin-left:\d+\.\d+pt|0in \d"#)
        .expect("valid word html regex")
});

/// At most this many cell texts are kept for inspection.
pub const SAMPLE_CELLS: usize = 15;
/// At most this many artifact matches are kept as examples.
pub const SAMPLE_ARTIFACTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureClassification {
    Table,
    UnorderedList,
    OrderedList,
    Paragraphs,
    TextOnly,
}

impl StructureClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::UnorderedList => "unordered_list",
            Self::OrderedList => "ordered_list",
            Self::Paragraphs => "paragraphs",
            Self::TextOnly => "text_only",
        }
    }
}

impl std::fmt::Display for StructureClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Word-processor artifacts found in a table's markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactScan {
    pub hits: usize,
    pub samples: Vec<String>,
}

/// What a tabular block contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    pub row_count: usize,
    /// Cells in the first row.
    pub column_count: usize,
    /// The first row is always read as the header when the table has rows.
    pub has_header: bool,
    pub header_cells: Vec<String>,
    pub sample_cells: Vec<String>,
    /// Cell texts of every row after the header.
    pub rows: Vec<Vec<String>>,
    pub artifacts: ArtifactScan,
    /// Inline-styled `<span>`s inside cells, another word-processor tell.
    pub has_styled_spans: bool,
}

pub fn classify(block: ElementRef<'_>) -> StructureClassification {
    let has = |sel: &Selector| block.select(sel).next().is_some();
    if has(&TABLE) {
        StructureClassification::Table
    } else if has(&UL) {
        StructureClassification::UnorderedList
    } else if has(&OL) {
        StructureClassification::OrderedList
    } else if has(&LI) {
        StructureClassification::UnorderedList
    } else if has(&P) {
        StructureClassification::Paragraphs
    } else {
        StructureClassification::TextOnly
    }
}

/// Classifies `block` and, when it holds a table, extracts the first one.
pub fn classify_and_extract(
    block: ElementRef<'_>,
) -> (StructureClassification, Option<TableData>) {
    let class = classify(block);
    let data = match class {
        StructureClassification::Table => block.select(&TABLE).next().map(extract_table),
        _ => None,
    };
    (class, data)
}

fn extract_table(table: ElementRef<'_>) -> TableData {
    let rows: Vec<ElementRef<'_>> = table.select(&TR).collect();
    let first = rows.first().copied();
    let column_count = first.map(|r| r.select(&CELL).count()).unwrap_or(0);
    let has_header = first.is_some();
    let header_cells = first.map(cell_texts).unwrap_or_default();
    let body_rows = rows
        .iter()
        .skip(1)
        .map(|row| cell_texts(*row))
        .collect();
    let sample_cells = table
        .select(&CELL)
        .take(SAMPLE_CELLS)
        .map(element_text)
        .collect();

    TableData {
        row_count: rows.len(),
        column_count,
        has_header,
        header_cells,
        sample_cells,
        rows: body_rows,
        artifacts: scan_artifacts(&table.html()),
        has_styled_spans: table.select(&STYLED_SPAN).next().is_some(),
    }
}

fn cell_texts(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL).map(element_text).collect()
}

/// Counts word-processor signatures in raw markup.
pub fn scan_artifacts(markup: &str) -> ArtifactScan {
    let mut scan = ArtifactScan::default();
    for m in ARTIFACT.find_iter(markup) {
        scan.hits += 1;
        if scan.samples.len() < SAMPLE_ARTIFACTS {
            scan.samples.push(m.as_str().to_string());
        }
    }
    scan
}

/// Whether `el` looks like pasted word-processor HTML.
pub fn is_word_html(el: ElementRef<'_>) -> bool {
    WORD_HTML.is_match(&el.html())
}

/// Flattens a content block into display lines.
///
/// Table rows after the header become one line each (cells joined with
/// `" | "`); a single-row table keeps that row as its only line; lists give one line per item; anything else gives one line per
/// visual line of text. A table with more than `degrade_threshold` artifact
/// hits is read as plain text instead.
pub fn block_lines(block: ElementRef<'_>, degrade_threshold: usize) -> Vec<String> {
    match classify_and_extract(block) {
        (StructureClassification::Table, Some(data)) => {
            if data.artifacts.hits > degrade_threshold {
                tracing::debug!(
                    "table has {} authoring artifacts, reading as text",
                    data.artifacts.hits
                );
                return text_lines(block);
            }
            let rows = if data.rows.is_empty() {
                vec![data.header_cells]
            } else {
                data.rows
            };
            rows.into_iter()
                .filter_map(|cells| {
                    let cells: Vec<String> = cells.into_iter().filter(|c| !c.is_empty()).collect();
                    (!cells.is_empty()).then(|| cells.join(" | "))
                })
                .collect()
        }
        (StructureClassification::UnorderedList | StructureClassification::OrderedList, _) => block
            .select(&LI)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect(),
        _ => text_lines(block),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DIV;
    use scraper::Html;

    fn with_block<T>(inner: &str, f: impl FnOnce(ElementRef<'_>) -> T) -> T {
        let html = format!("<div class=\"block\">{inner}</div>");
        let doc = Html::parse_fragment(&html);
        let block = doc.root_element().select(&DIV).next().unwrap();
        f(block)
    }

    #[test]
    fn table_wins_over_stray_text() {
        let class = with_block(
            "Some intro text <table><tr><td>a</td></tr></table> trailing",
            classify,
        );
        assert_eq!(class, StructureClassification::Table);
    }

    #[test]
    fn list_items_are_unordered_list() {
        let class = with_block("<ul><li>One</li><li>Two</li></ul>", classify);
        assert_eq!(class, StructureClassification::UnorderedList);
    }

    #[test]
    fn bare_list_items_are_unordered_list() {
        let inner = "<li>One</li><li>Two</li>";
        assert_eq!(
            with_block(inner, classify),
            StructureClassification::UnorderedList
        );
        assert_eq!(with_block(inner, |b| block_lines(b, 10)), vec!["One", "Two"]);
    }

    #[test]
    fn ordered_list_detected() {
        let class = with_block("<ol><li>One</li></ol>", classify);
        assert_eq!(class, StructureClassification::OrderedList);
    }

    #[test]
    fn paragraphs_then_text() {
        assert_eq!(
            with_block("<p>Para</p>", classify),
            StructureClassification::Paragraphs
        );
        assert_eq!(
            with_block("just some words", classify),
            StructureClassification::TextOnly
        );
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&StructureClassification::UnorderedList).unwrap(),
            "\"unordered_list\""
        );
        assert_eq!(StructureClassification::TextOnly.to_string(), "text_only");
    }

    #[test]
    fn extracts_table_shape() {
        let (class, data) = with_block(
            r#"<table>
                 <tr><th>Institution</th><th>Award</th><th>Year</th></tr>
                 <tr><td>University of Nairobi</td><td>BA</td><td>1995</td></tr>
                 <tr><td>Strathmore</td><td>MBA</td><td>2004</td></tr>
               </table>"#,
            classify_and_extract,
        );
        assert_eq!(class, StructureClassification::Table);
        let data = data.unwrap();
        assert_eq!(data.row_count, 3);
        assert_eq!(data.column_count, 3);
        assert!(data.has_header);
        assert_eq!(data.header_cells, vec!["Institution", "Award", "Year"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.sample_cells.len(), 9);
        assert_eq!(data.artifacts.hits, 0);
        assert!(!data.has_styled_spans);
    }

    #[test]
    fn sample_cells_are_bounded() {
        let rows: String = (0..10)
            .map(|i| format!("<tr><td>{i}a</td><td>{i}b</td></tr>"))
            .collect();
        let data = with_block(&format!("<table>{rows}</table>"), classify_and_extract)
            .1
            .unwrap();
        assert_eq!(data.sample_cells.len(), SAMPLE_CELLS);
        assert_eq!(data.sample_cells[0], "0a");
    }

    #[test]
    fn counts_word_artifacts() {
        let (_, data) = with_block(
            r#"<table style="border:solid 1px">
                 <tr><td style="margin-left:5.4pt;font-family:'Times New Roman'">
                   <span style="font-size:12pt">2010</span></td></tr>
               </table>"#,
            classify_and_extract,
        );
        let data = data.unwrap();
        assert!(data.artifacts.hits >= 3);
        assert!(data.artifacts.samples.len() <= SAMPLE_ARTIFACTS);
        assert!(data.has_styled_spans);
        assert!(data.has_header);
        assert_eq!(data.header_cells, vec!["2010"]);
        assert!(data.rows.is_empty());
    }

    #[test]
    fn single_row_table_uses_first_row_as_header() {
        let html = "<table><tr><td>Institution</td><td>Award</td></tr></table>";
        let data = with_block(html, classify_and_extract).1.unwrap();
        assert_eq!(data.row_count, 1);
        assert!(data.has_header);
        assert_eq!(data.header_cells, vec!["Institution", "Award"]);
        assert!(data.rows.is_empty());

        let lines = with_block(html, |b| block_lines(b, 10));
        assert_eq!(lines, vec!["Institution | Award"]);
    }

    #[test]
    fn table_lines_skip_header() {
        let lines = with_block(
            r#"<table>
                 <tr><td>From</td><td>To</td><td>Employer</td></tr>
                 <tr><td>2013</td><td>2017</td><td>County Assembly</td></tr>
                 <tr><td></td><td></td><td></td></tr>
               </table>"#,
            |b| block_lines(b, 10),
        );
        assert_eq!(lines, vec!["2013 | 2017 | County Assembly"]);
    }

    #[test]
    fn polluted_table_degrades_to_text() {
        let cell = r#"<td style="margin-left:1.0pt">x</td>"#;
        let lines = with_block(
            &format!("<table><tr>{cell}{cell}</tr><tr>{cell}{cell}</tr></table>"),
            |b| block_lines(b, 2),
        );
        assert_eq!(lines, vec!["x", "x", "x", "x"]);
    }

    #[test]
    fn list_lines_one_per_item() {
        let lines = with_block("<ul><li>Chair, Budget</li><li> </li><li>Member, PIC</li></ul>", |b| {
            block_lines(b, 10)
        });
        assert_eq!(lines, vec!["Chair, Budget", "Member, PIC"]);
    }

    #[test]
    fn word_html_detection() {
        assert!(with_block(
            r#"<p style="margin-left:.5in;text-indent:0in 0">x</p>"#,
            is_word_html
        ));
        assert!(!with_block("<p>plain</p>", is_word_html));
    }
}
