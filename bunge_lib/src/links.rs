//! Profile-link discovery on listing pages.

use std::sync::LazyLock;

use bunge_api::{slug_from_url, SiteUrls};
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::dom::{class_matches, element_text, ANCHOR, IMG};
use crate::text::non_empty;
use crate::types::ProfileLink;

static MEMBER_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)member|mp-profile").expect("valid member class regex"));

/// Extracts member profile links from one listing page.
///
/// Anchors whose `href` contains `profile_marker` are taken first. Only when
/// there are none does the looser pass run: anchors with a member-like class
/// whose `href` contains the marker's last path segment. Links are
/// deduplicated by resolved URL in first-seen order, merging the name and
/// thumbnail from later duplicates when the first lacked them. A page with
/// no matching anchors yields an empty list.
pub fn extract_links(html: &str, urls: &SiteUrls, profile_marker: &str) -> Vec<ProfileLink> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let strict: Vec<ElementRef<'_>> = root
        .select(&ANCHOR)
        .filter(|a| href(*a).is_some_and(|h| h.contains(profile_marker)))
        .collect();

    let anchors = if strict.is_empty() {
        let loose_marker = loose_marker(profile_marker);
        root.select(&ANCHOR)
            .filter(|a| class_matches(*a, &MEMBER_CLASS))
            .filter(|a| href(*a).is_some_and(|h| h.contains(loose_marker)))
            .collect()
    } else {
        strict
    };

    let mut links: Vec<ProfileLink> = Vec::new();
    for anchor in anchors {
        let Some(link) = link_from_anchor(anchor, urls) else {
            continue;
        };
        match links.iter_mut().find(|l| l.url == link.url) {
            Some(existing) => {
                if existing.name.is_none() {
                    existing.name = link.name;
                }
                if existing.photo_url.is_none() {
                    existing.photo_url = link.photo_url;
                }
            }
            None => links.push(link),
        }
    }
    links
}

fn href<'a>(anchor: ElementRef<'a>) -> Option<&'a str> {
    anchor.value().attr("href")
}

fn loose_marker(profile_marker: &str) -> &str {
    profile_marker
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(profile_marker)
}

fn link_from_anchor(anchor: ElementRef<'_>, urls: &SiteUrls) -> Option<ProfileLink> {
    let url = urls.resolve(href(anchor)?)?;
    let slug = slug_from_url(&url)?;
    let img = anchor.select(&IMG).next();

    let name = img
        .and_then(|img| img.value().attr("alt"))
        .and_then(non_empty)
        .or_else(|| non_empty(&element_text(anchor)));
    let photo_url = img
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| urls.resolve(src));

    Some(ProfileLink {
        slug,
        url,
        name,
        photo_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "/the-national-assembly/hon-";

    fn urls() -> SiteUrls {
        SiteUrls::new("https://www.parliament.go.ke", "/the-national-assembly/mps", "page").unwrap()
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert!(extract_links("", &urls(), MARKER).is_empty());
        assert!(extract_links(
            "<html><body><a href=\"/about\">About</a></body></html>",
            &urls(),
            MARKER
        )
        .is_empty());
    }

    #[test]
    fn finds_profile_anchors_with_photos() {
        let html = r#"
            <div class="view-content">
              <a href="/the-national-assembly/hon-jane-doe">
                <img src="/sites/default/files/styles/thumb/jane.jpg" alt="Hon. Jane Doe">
              </a>
              <a href="/the-national-assembly/hon-jane-doe">Hon. Jane Doe</a>
              <a href="https://www.parliament.go.ke/the-national-assembly/hon-john-roe">John Roe</a>
              <a href="/the-national-assembly/committees">Committees</a>
            </div>"#;
        let links = extract_links(html, &urls(), MARKER);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].slug, "hon-jane-doe");
        assert_eq!(links[0].name.as_deref(), Some("Hon. Jane Doe"));
        assert_eq!(
            links[0].photo_url.as_deref(),
            Some("https://www.parliament.go.ke/sites/default/files/styles/thumb/jane.jpg")
        );
        assert_eq!(links[1].slug, "hon-john-roe");
        assert_eq!(links[1].photo_url, None);
    }

    #[test]
    fn later_duplicate_fills_missing_photo() {
        let html = r#"
            <a href="/the-national-assembly/hon-a-b">A B</a>
            <a href="/the-national-assembly/hon-a-b"><img src="/p/ab.jpg" alt=""></a>"#;
        let links = extract_links(html, &urls(), MARKER);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].name.as_deref(), Some("A B"));
        assert_eq!(
            links[0].photo_url.as_deref(),
            Some("https://www.parliament.go.ke/p/ab.jpg")
        );
    }

    #[test]
    fn falls_back_to_member_class() {
        let html = r#"
            <a class="mp-profile-link" href="/members/hon-x-y">X Y</a>
            <a class="member" href="/members/about">About</a>
            <a href="/members/hon-not-classed">Nope</a>"#;
        let links = extract_links(html, &urls(), MARKER);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://www.parliament.go.ke/members/hon-x-y");
    }

    #[test]
    fn loose_pass_skipped_when_strict_matches() {
        let html = r#"
            <a href="/the-national-assembly/hon-one">One</a>
            <a class="member" href="/members/hon-two">Two</a>"#;
        let links = extract_links(html, &urls(), MARKER);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].slug, "hon-one");
    }

    #[test]
    fn base64_thumbnails_are_ignored() {
        let html = r#"<a href="/the-national-assembly/hon-z"><img src="data:image/png;base64,AAA" alt="Z"></a>"#;
        let links = extract_links(html, &urls(), MARKER);
        assert_eq!(links[0].photo_url, None);
        assert_eq!(links[0].name.as_deref(), Some("Z"));
    }
}
