//! Small traversal helpers over `scraper` element trees.
//!
//! `Html` is not `Send`, so documents are parsed and dropped inside
//! synchronous functions; nothing in here is ever held across an await.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::text::{non_empty, normalize_text};

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

pub(crate) static ANY: LazyLock<Selector> = LazyLock::new(|| selector("*"));
pub(crate) static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
pub(crate) static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
pub(crate) static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
pub(crate) static DIV: LazyLock<Selector> = LazyLock::new(|| selector("div"));
pub(crate) static LI: LazyLock<Selector> = LazyLock::new(|| selector("li"));
pub(crate) static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));

/// Class tokens of Drupal field labels, which never belong in a value.
static LABEL_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^field-{1,2}label$|^field__label$").expect("valid label regex"));

/// Elements whose boundaries start a new line of text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "table",
    "section", "article", "blockquote",
];

/// Normalized text of an element and all of its descendants.
pub fn element_text(el: ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<String>())
}

/// Whether any class token of `el` matches `pattern`.
pub fn class_matches(el: ElementRef<'_>, pattern: &Regex) -> bool {
    el.value().classes().any(|class| pattern.is_match(class))
}

/// First element selected by `sel` under `root` with a class matching `pattern`.
pub fn find_by_class<'a>(
    root: ElementRef<'a>,
    sel: &Selector,
    pattern: &Regex,
) -> Option<ElementRef<'a>> {
    root.select(sel).find(|el| class_matches(*el, pattern))
}

/// Every text node under `root` outside `<script>`/`<style>`, in document order.
pub fn text_nodes<'a>(root: ElementRef<'a>) -> impl Iterator<Item = (ElementRef<'a>, &'a str)> {
    root.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let parent = node.parent().and_then(ElementRef::wrap)?;
        match parent.value().name() {
            "script" | "style" | "noscript" => None,
            _ => Some((parent, &**text)),
        }
    })
}

/// Visible text of `el` split into lines at block boundaries and `<br>`.
///
/// Field labels are skipped and blank lines dropped.
pub fn text_lines(el: ElementRef<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    collect_lines(el, &mut current, &mut lines);
    flush_line(&mut current, &mut lines);
    lines
}

fn collect_lines(el: ElementRef<'_>, current: &mut String, lines: &mut Vec<String>) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            current.push_str(text);
            continue;
        }
        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child_el.value().name();
        match name {
            "br" => flush_line(current, lines),
            "script" | "style" | "noscript" => {}
            _ if class_matches(child_el, &LABEL_CLASS) => {}
            _ => {
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    flush_line(current, lines);
                }
                collect_lines(child_el, current, lines);
                if block {
                    flush_line(current, lines);
                }
            }
        }
    }
}

fn flush_line(current: &mut String, lines: &mut Vec<String>) {
    if let Some(line) = non_empty(current) {
        lines.push(line);
    }
    current.clear();
}

/// Text of `<h1>`, falling back to `<title>`; empty when the page has neither.
pub fn page_title(root: ElementRef<'_>) -> String {
    root.select(&H1)
        .chain(root.select(&TITLE))
        .map(element_text)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn element_text_is_normalized() {
        let doc = Html::parse_fragment("<h1>  Hon.&nbsp;Jane <b>Doe</b>\n</h1>");
        let h1 = doc.root_element().select(&H1).next().unwrap();
        assert_eq!(element_text(h1), "Hon. Jane Doe");
    }

    #[test]
    fn lines_split_on_blocks_and_breaks() {
        let doc = Html::parse_fragment(
            r#"<div class="field--name-field-education-background">
                 <div class="field__label">Education Background</div>
                 <p>BSc <strong>Economics</strong>, 1998</p>
                 <p>  </p>
                 MBA<br>Strathmore
               </div>"#,
        );
        let block = doc.root_element().select(&DIV).next().unwrap();
        assert_eq!(
            text_lines(block),
            vec!["BSc Economics, 1998", "MBA", "Strathmore"]
        );
    }

    #[test]
    fn text_nodes_skip_scripts() {
        let doc = Html::parse_document(
            "<html><body><script>var tel = '0712345678';</script><p>hi</p></body></html>",
        );
        let texts: Vec<&str> = text_nodes(doc.root_element()).map(|(_, t)| t).collect();
        assert!(texts.contains(&"hi"));
        assert!(!texts.iter().any(|t| t.contains("0712345678")));
    }

    #[test]
    fn title_falls_back_to_title_tag() {
        let doc = Html::parse_document("<html><head><title>Hansard</title></head><body></body></html>");
        assert_eq!(page_title(doc.root_element()), "Hansard");
    }
}
