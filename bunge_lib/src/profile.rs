//! Field extraction from a member profile page.
//!
//! Each logical field is read by an ordered cascade of [`Strategy`] values;
//! the first strategy that yields a non-empty value wins. Only the name is
//! mandatory. Every other field falls back to `None` or an empty list.

use std::sync::LazyLock;

use bunge_api::SiteUrls;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::ExtractConfig;
use crate::dom::{
    class_matches, element_text, find_by_class, selector, text_nodes, ANCHOR, ANY, DIV, H1, IMG,
    LI,
};
use crate::error::ParseError;
use crate::table::block_lines;
use crate::text::{derive_wiki_title, non_empty, normalize_text, truncate_chars};
use crate::types::{MpRecord, ProfileLink};

static TITLE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)page-title|title").expect("valid title regex"));
static BIO_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)body|biography").expect("valid bio regex"));
static PHOTO_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)photo|image|portrait").expect("valid photo regex"));
static COMMITTEE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)committee").expect("valid committee regex"));
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d])(\+254[\s-]?\d{3}[\s-]?\d{6}|0\d{3}[\s-]?\d{6})(?:$|[^\d])")
        .expect("valid phone regex")
});
static COUNTY_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^field-+name-+field-+county$").expect("valid county regex"));
static CONSTITUENCY_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^field-+name-+field-+constituency$").expect("valid constituency regex")
});
static PARTY_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^field-+name-+field-+(?:political-)?party$").expect("valid party regex")
});
static FIELD_VALUE: LazyLock<Selector> =
    LazyLock::new(|| selector(".field__item, .field-item, .field-items"));
static EDUCATION_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^field--name-field-education-background$").expect("valid education regex")
});
static EMPLOYMENT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^field--name-field-employment-history$").expect("valid employment regex")
});

/// A parsed profile document plus what strategies need to resolve links.
pub struct ProfilePage<'a> {
    pub root: ElementRef<'a>,
    pub urls: &'a SiteUrls,
}

/// One way of reading a field.
pub struct Strategy<T> {
    /// Marker name used in probe coverage, e.g. `title_heading`.
    pub id: &'static str,
    pub run: fn(&ProfilePage<'_>) -> Option<T>,
}

/// Runs `strategies` in order and returns the first value found.
pub fn cascade<T>(page: &ProfilePage<'_>, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|s| {
        let value = (s.run)(page);
        if value.is_some() {
            tracing::trace!("cascade hit: {}", s.id);
        }
        value
    })
}

pub const NAME: &[Strategy<String>] = &[
    Strategy {
        id: "title_heading",
        run: name_from_title_heading,
    },
    Strategy {
        id: "first_heading",
        run: name_from_first_heading,
    },
];

pub const COUNTY: &[Strategy<String>] = &[
    Strategy {
        id: "label_sibling",
        run: |p| label_sibling(p.root, &["county"]),
    },
    Strategy {
        id: "field_container",
        run: |p| field_container(p.root, &COUNTY_FIELD),
    },
];

pub const CONSTITUENCY: &[Strategy<String>] = &[
    Strategy {
        id: "label_sibling",
        run: |p| label_sibling(p.root, &["constituency"]),
    },
    Strategy {
        id: "field_container",
        run: |p| field_container(p.root, &CONSTITUENCY_FIELD),
    },
];

pub const PARTY: &[Strategy<String>] = &[
    Strategy {
        id: "label_sibling",
        run: |p| label_sibling(p.root, &["party", "political party"]),
    },
    Strategy {
        id: "field_container",
        run: |p| field_container(p.root, &PARTY_FIELD),
    },
];

pub const EMAIL: &[Strategy<String>] = &[Strategy {
    id: "mailto_link",
    run: email_from_mailto,
}];

pub const PHONE_NUMBER: &[Strategy<String>] = &[Strategy {
    id: "text_pattern",
    run: phone_from_text,
}];

pub const BIO: &[Strategy<String>] = &[Strategy {
    id: "body_block",
    run: |p| {
        find_by_class(p.root, &DIV, &BIO_CLASS).and_then(|el| non_empty(&element_text(el)))
    },
}];

pub const PHOTO: &[Strategy<String>] = &[
    Strategy {
        id: "photo_class",
        run: |p| {
            photo_candidates(p)
                .find(|(img, _)| class_matches(*img, &PHOTO_CLASS))
                .map(|(_, src)| src)
        },
    },
    Strategy {
        id: "first_image",
        run: |p| photo_candidates(p).next().map(|(_, src)| src),
    },
];

pub const COMMITTEES: &[Strategy<Vec<String>>] = &[Strategy {
    id: "committee_block",
    run: committees_from_block,
}];

/// Every cascade, keyed by field, for marker inspection.
const STRING_FIELDS: &[(&str, &[Strategy<String>])] = &[
    ("name", NAME),
    ("county", COUNTY),
    ("constituency", CONSTITUENCY),
    ("party", PARTY),
    ("email", EMAIL),
    ("phone", PHONE_NUMBER),
    ("bio", BIO),
    ("photo", PHOTO),
];

/// Parses one profile page into a record.
///
/// The slug and profile URL come from `link`, and its listing thumbnail
/// stands in when the page has no photo of its own. Fails only when the
/// page has no usable `<h1>`; any other missing field is left empty.
pub fn parse_profile(
    html: &str,
    link: &ProfileLink,
    urls: &SiteUrls,
    extract: &ExtractConfig,
) -> Result<MpRecord, ParseError> {
    let doc = Html::parse_document(html);
    let page = ProfilePage {
        root: doc.root_element(),
        urls,
    };

    let name = cascade(&page, NAME).ok_or_else(|| ParseError::MissingHeading {
        url: link.url.clone(),
    })?;

    let section = |pattern: &Regex| -> Vec<String> {
        find_by_class(page.root, &ANY, pattern)
            .map(|el| block_lines(el, extract.artifact_degrade_threshold))
            .unwrap_or_default()
    };

    Ok(MpRecord {
        slug: link.slug.clone(),
        profile_url: link.url.clone(),
        wiki_title: derive_wiki_title(&name),
        county: cascade(&page, COUNTY),
        constituency: cascade(&page, CONSTITUENCY),
        party: cascade(&page, PARTY),
        email: cascade(&page, EMAIL),
        phone: cascade(&page, PHONE_NUMBER),
        bio: cascade(&page, BIO).map(|bio| truncate_chars(&bio, extract.bio_max_chars)),
        photo_url: cascade(&page, PHOTO).or_else(|| link.photo_url.clone()),
        committees: cascade(&page, COMMITTEES).unwrap_or_default(),
        education: section(&*EDUCATION_FIELD),
        employment_history: section(&*EMPLOYMENT_FIELD),
        name,
    })
}

/// Runs every strategy of every field independently and reports which
/// markers are present, as `field.strategy` keys.
pub fn inspect_markers(page: &ProfilePage<'_>) -> Vec<(String, bool)> {
    let mut markers = Vec::new();
    for (field, strategies) in STRING_FIELDS {
        for s in strategies.iter() {
            markers.push((format!("{}.{}", field, s.id), (s.run)(page).is_some()));
        }
    }
    for s in COMMITTEES {
        markers.push((format!("committees.{}", s.id), (s.run)(page).is_some()));
    }
    markers
}

fn name_from_title_heading(page: &ProfilePage<'_>) -> Option<String> {
    find_by_class(page.root, &H1, &TITLE_CLASS).and_then(|h1| non_empty(&element_text(h1)))
}

fn name_from_first_heading(page: &ProfilePage<'_>) -> Option<String> {
    page.root
        .select(&H1)
        .find_map(|h1| non_empty(&element_text(h1)))
}

/// Finds a text node reading exactly one of `labels` (ignoring case and a
/// trailing colon) and returns the text of the element after it.
fn label_sibling(root: ElementRef<'_>, labels: &[&str]) -> Option<String> {
    text_nodes(root).find_map(|(parent, text)| {
        let text = normalize_text(text);
        let label = text.trim_end_matches(':').trim().to_lowercase();
        if !labels.contains(&label.as_str()) {
            return None;
        }
        // The label may be wrapped (`<td><strong>County</strong></td>`), so
        // climb a few levels looking for the element that follows it.
        let mut label_el = parent;
        for _ in 0..3 {
            if let Some(value) = label_el.next_siblings().find_map(ElementRef::wrap) {
                return non_empty(&element_text(value));
            }
            label_el = label_el.parent().and_then(ElementRef::wrap)?;
        }
        None
    })
}

/// Reads the value out of a Drupal field container whose class matches
/// `pattern`.
fn field_container(root: ElementRef<'_>, pattern: &Regex) -> Option<String> {
    let container = find_by_class(root, &ANY, pattern)?;
    if let Some(value) = container
        .select(&FIELD_VALUE)
        .find_map(|el| non_empty(&element_text(el)))
    {
        return Some(value);
    }
    // No value wrapper: strip the label text from the container's own text.
    let text = element_text(container);
    let label = container
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().classes().any(|c| c.contains("label")))
        .map(element_text)
        .unwrap_or_default();
    non_empty(text.strip_prefix(label.as_str()).unwrap_or(&text).trim_start_matches(':'))
}

fn email_from_mailto(page: &ProfilePage<'_>) -> Option<String> {
    page.root.select(&ANCHOR).find_map(|a| {
        let href = a.value().attr("href")?.trim();
        let scheme = href.get(..7)?;
        if !scheme.eq_ignore_ascii_case("mailto:") {
            return None;
        }
        let address = href[7..].split('?').next().unwrap_or_default();
        non_empty(address)
    })
}

fn phone_from_text(page: &ProfilePage<'_>) -> Option<String> {
    text_nodes(page.root).find_map(|(_, text)| {
        let caps = PHONE.captures(text)?;
        let number: String = caps[1]
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        Some(number)
    })
}

/// Images with a usable absolute source, excluding site chrome.
fn photo_candidates<'a>(
    page: &'a ProfilePage<'a>,
) -> impl Iterator<Item = (ElementRef<'a>, String)> + 'a {
    page.root.select(&IMG).filter_map(move |img| {
        let src = img.value().attr("src")?;
        let lower = src.to_lowercase();
        if lower.contains("logo") || lower.contains("banner") {
            return None;
        }
        Some((img, page.urls.resolve(src)?))
    })
}

fn committees_from_block(page: &ProfilePage<'_>) -> Option<Vec<String>> {
    let block = find_by_class(page.root, &DIV, &COMMITTEE_CLASS)?;
    let items: Vec<String> = block
        .select(&LI)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}
