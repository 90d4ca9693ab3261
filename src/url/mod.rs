//! URL handling for category crawls
//!
//! This module builds listing page URLs, resolves listing hrefs against the
//! site root, and decides whether an article URL belongs to the crawled category.

mod matcher;

use crate::{UrlError, UrlResult};
use url::Url;

pub use matcher::matches_category;

/// Builds the listing URL for one page of a category
///
/// Page 1 is the bare category path; later pages append `/page/N`.
///
/// # Examples
///
/// ```
/// use spacebar_scraper::url::listing_url;
/// use url::Url;
///
/// let base = Url::parse("https://spacebar.th").unwrap();
/// assert_eq!(
///     listing_url(&base, "politics", 1).unwrap().as_str(),
///     "https://spacebar.th/category/politics"
/// );
/// assert_eq!(
///     listing_url(&base, "politics", 3).unwrap().as_str(),
///     "https://spacebar.th/category/politics/page/3"
/// );
/// ```
pub fn listing_url(base: &Url, category: &str, page: u32) -> UrlResult<Url> {
    let path = if page <= 1 {
        format!("/category/{}", category)
    } else {
        format!("/category/{}/page/{}", category, page)
    };

    base.join(&path).map_err(|e| UrlError::Parse(e.to_string()))
}

/// Resolves a listing href into an absolute URL against the site root
///
/// Relative and root-relative hrefs are joined to `base`; absolute hrefs are
/// kept as-is. An empty href resolves to `base` itself, which the category
/// filter then rejects.
pub fn resolve_link(href: &str, base: &Url) -> UrlResult<Url> {
    base.join(href.trim())
        .map_err(|e| UrlError::Parse(format!("{} ({})", href, e)))
}

/// Parses the configured site root
pub fn parse_base(base_url: &str) -> UrlResult<Url> {
    let url = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    Ok(url)
}
