//! Article page parser
//!
//! Extracts the record persisted for each article: title, display date,
//! body text and URL. Missing fields degrade to fallbacks rather than errors.

use crate::crawler::dom::{selector, text_of};
use crate::crawler::listing::CandidateLink;
use crate::ScraperError;
use scraper::Html;
use serde::Serialize;

/// Published value used when the page shows no date
pub const NO_DATE: &str = "-";

/// Separator between body blocks
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

const TITLE_SELECTOR: &str = "h1.article-title";
const DATE_SELECTOR: &str = r#"p[class="text-gray-400 text-subheadsm mb-4 md:mb-0"]"#;
const CONTENT_SELECTOR: &str = "div.payload-richtext";
const BLOCK_SELECTOR: &str = "p, li, blockquote, h2, h3";

/// One extracted article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,

    /// Body blocks joined by a blank line
    pub body: String,

    /// Date as displayed on the page, or "-"
    pub published: String,

    /// Article URL; unique within a run
    pub url: String,
}

/// Parses a fetched article page
///
/// # Field rules
///
/// - **title**: `h1.article-title`, else the listing headline
/// - **published**: the date paragraph under the title, else `"-"`
/// - **body**: text of `p`, `li`, `blockquote`, `h2` and `h3` inside the
///   rich-text container, in document order, empty blocks skipped; empty
///   string when the container is missing
///
/// # Returns
///
/// * `Ok(Article)` - Extracted article
/// * `Err(ScraperError::HtmlParse)` - The extraction rules could not be applied
pub fn parse_article(html: &str, link: &CandidateLink) -> Result<Article, ScraperError> {
    let parse_error = |message: String| ScraperError::HtmlParse {
        url: link.absolute_url.clone(),
        message,
    };

    let title_selector = selector(TITLE_SELECTOR).map_err(parse_error)?;
    let date_selector = selector(DATE_SELECTOR).map_err(parse_error)?;
    let content_selector = selector(CONTENT_SELECTOR).map_err(parse_error)?;
    let block_selector = selector(BLOCK_SELECTOR).map_err(parse_error)?;

    let document = Html::parse_document(html);

    let title = document
        .select(&title_selector)
        .next()
        .map(text_of)
        .unwrap_or_else(|| link.headline.clone());

    let published = document
        .select(&date_selector)
        .next()
        .map(text_of)
        .unwrap_or_else(|| NO_DATE.to_string());

    let body = match document.select(&content_selector).next() {
        Some(container) => container
            .select(&block_selector)
            .map(text_of)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR),
        None => String::new(),
    };

    Ok(Article {
        title,
        body,
        published,
        url: link.absolute_url.clone(),
    })
}
