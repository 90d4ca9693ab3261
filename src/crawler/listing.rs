//! Listing page parser
//!
//! This module turns a category listing page into the ordered list of
//! article teasers it contains:
//! - The daily highlight block is removed first, so its articles are only
//!   collected where they appear in normal listing order
//! - Anchors labelled as article links are collected in document order
//! - Each anchor yields a headline and a raw href
//!
//! Resolving and filtering an entry against the crawled category happens in
//! [`to_candidate`].

use crate::crawler::dom::{has_class, selector, text_of};
use crate::url::{matches_category, resolve_link};
use crate::UrlResult;
use scraper::{ElementRef, Html};
use url::Url;

/// Heading text of the daily highlight block
pub const HIGHLIGHT_HEADING: &str = "เรื่องเด่นประจำวัน";

/// Accessibility labels that mark article anchors
pub const ARTICLE_LINK_LABELS: [&str; 2] = ["articleLink", "latestArticleLink"];

/// Headline text used when a teaser has none
pub const NO_HEADLINE: &str = "No Headline";

const HIGHLIGHT_CONTAINER_CLASS: &str = "w-full";
const HEADLINE_SELECTOR: &str = r#"div[class="w-full text-base font-semibold text-gray-700 hover:text-accentual-blue-main mb-2 line-clamp-3"]"#;
const FALLBACK_HEADLINE_SELECTOR: &str = "h3";

/// One article teaser found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Headline as shown on the listing
    pub headline: String,

    /// Raw href attribute (may be relative or empty)
    pub href: String,
}

/// A listing entry resolved to an absolute URL inside the crawled category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub headline: String,
    pub absolute_url: String,
}

/// Parses a listing page into its article teasers
///
/// Returns an empty list when the page has no article anchors, which marks
/// the end of the category.
///
/// # Example
///
/// ```
/// use spacebar_scraper::crawler::parse_listing;
///
/// let html = r#"<a aria-label="articleLink" href="/politics/a"><h3>A</h3></a>"#;
/// let entries = parse_listing(html);
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].headline, "A");
/// ```
pub fn parse_listing(html: &str) -> Vec<ListingEntry> {
    let mut document = Html::parse_document(html);
    remove_highlight_block(&mut document);
    extract_entries(&document)
}

/// Resolves an entry and applies the category filter
///
/// # Returns
///
/// * `Ok(Some(CandidateLink))` - the entry points into the category
/// * `Ok(None)` - the entry belongs to another category
/// * `Err(UrlError)` - the href could not be resolved
pub fn to_candidate(
    entry: &ListingEntry,
    base: &Url,
    category: &str,
) -> UrlResult<Option<CandidateLink>> {
    let url = resolve_link(&entry.href, base)?;

    if !matches_category(&url, category) {
        return Ok(None);
    }

    Ok(Some(CandidateLink {
        headline: entry.headline.clone(),
        absolute_url: url.to_string(),
    }))
}

/// Detaches the daily highlight container from the document
fn remove_highlight_block(document: &mut Html) {
    let Ok(heading_selector) = selector("h2") else {
        return;
    };

    let blocks: Vec<_> = document
        .select(&heading_selector)
        .filter(|heading| text_of(*heading) == HIGHLIGHT_HEADING)
        .filter_map(|heading| {
            heading
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "div" && has_class(*el, HIGHLIGHT_CONTAINER_CLASS))
        })
        .map(|block| block.id())
        .collect();

    for id in blocks {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn extract_entries(document: &Html) -> Vec<ListingEntry> {
    let anchors_css = ARTICLE_LINK_LABELS
        .iter()
        .map(|label| format!(r#"a[aria-label="{}"]"#, label))
        .collect::<Vec<_>>()
        .join(", ");

    let (Ok(anchors), Ok(headline), Ok(fallback)) = (
        selector(&anchors_css),
        selector(HEADLINE_SELECTOR),
        selector(FALLBACK_HEADLINE_SELECTOR),
    ) else {
        return Vec::new();
    };

    // Detached nodes stay in the tree's arena, so walk from the root only.
    document
        .root_element()
        .select(&anchors)
        .map(|anchor| {
            let headline = anchor
                .select(&headline)
                .next()
                .or_else(|| anchor.select(&fallback).next())
                .map(text_of)
                .unwrap_or_else(|| NO_HEADLINE.to_string());

            ListingEntry {
                headline,
                href: anchor.value().attr("href").unwrap_or("").to_string(),
            }
        })
        .collect()
}
