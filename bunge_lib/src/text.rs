//! Text normalization shared by every extractor.

use std::sync::LazyLock;

use regex::Regex;

/// Suffix appended to every derived encyclopedia title.
pub const WIKI_TITLE_SUFFIX: &str = "_(Kenyan_politician)";

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthetical regex"));

static HONORIFIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:hon|dr|prof|mrs|mr|ms|amb)\.\s*").expect("valid honorific regex")
});

/// Collapses whitespace runs to one space, turns non-breaking spaces (raw or
/// as a literal `&nbsp;` entity) into plain spaces, and trims the ends.
pub fn normalize_text(raw: &str) -> String {
    raw.replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized text, or `None` when nothing but whitespace remains.
pub fn non_empty(raw: &str) -> Option<String> {
    let text = normalize_text(raw);
    (!text.is_empty()).then_some(text)
}

/// Cuts `text` to at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Builds the encyclopedia article title for a member's display name.
///
/// Parenthetical content and honorifics (Hon., Dr., Prof., Mr., Mrs., Ms.,
/// Amb.) are dropped, the remaining words are joined with underscores, and
/// [`WIKI_TITLE_SUFFIX`] is appended. Feeding a derived title back in yields
/// the same title.
pub fn derive_wiki_title(name: &str) -> String {
    let base = name.trim().trim_end_matches(WIKI_TITLE_SUFFIX);
    let without_parens = PARENTHETICAL.replace_all(base, " ");
    let without_titles = HONORIFIC.replace_all(&without_parens, " ");
    let words: Vec<&str> = without_titles
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|w| !w.is_empty())
        .collect();
    format!("{}{}", words.join("_"), WIKI_TITLE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_nbsp() {
        assert_eq!(normalize_text("  Nairobi\u{a0}\n\t County  "), "Nairobi County");
        assert_eq!(normalize_text("Jane&nbsp;Doe"), "Jane Doe");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn non_empty_filters_blank() {
        assert_eq!(non_empty(" \n "), None);
        assert_eq!(non_empty(" ODM ").as_deref(), Some("ODM"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("ñañaña", 2), "ña");
    }

    #[test]
    fn wiki_title_strips_honorifics() {
        let with = derive_wiki_title("Hon. Amb. Langat Benjamin Kipkirui");
        let without = derive_wiki_title("Langat Benjamin Kipkirui");
        assert_eq!(with, without);
        assert_eq!(with, "Langat_Benjamin_Kipkirui_(Kenyan_politician)");
        assert!(with.ends_with(WIKI_TITLE_SUFFIX));
    }

    #[test]
    fn wiki_title_strips_parentheticals() {
        assert_eq!(
            derive_wiki_title("Dr. Jane Wanjiku (CBS) Doe"),
            "Jane_Wanjiku_Doe_(Kenyan_politician)"
        );
    }

    #[test]
    fn wiki_title_is_idempotent() {
        let once = derive_wiki_title("Hon. (Dr.) John Mbadi Ng'ong'o, EGH");
        assert_eq!(derive_wiki_title(&once), once);
    }

    #[test]
    fn wiki_title_is_case_insensitive_on_titles() {
        assert_eq!(
            derive_wiki_title("HON. PROF. MRS. Ms. Mary Otieno"),
            "Mary_Otieno_(Kenyan_politician)"
        );
    }
}
