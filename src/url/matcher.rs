use url::Url;

/// Checks whether an article URL belongs to a category
///
/// A URL matches when its path contains `/{category}/` as a segment, or
/// ends exactly with `/{category}`. Links to other categories that leak
/// into a listing page are rejected this way.
///
/// # Examples
///
/// ```
/// use spacebar_scraper::url::matches_category;
/// use url::Url;
///
/// let url = Url::parse("https://spacebar.th/politics/vote-count").unwrap();
/// assert!(matches_category(&url, "politics"));
/// assert!(!matches_category(&url, "business"));
/// ```
pub fn matches_category(url: &Url, category: &str) -> bool {
    let path = url.path();
    path.contains(&format!("/{}/", category)) || path.ends_with(&format!("/{}", category))
}
