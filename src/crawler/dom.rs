//! Small helpers shared by the listing and article parsers

use scraper::{ElementRef, Selector};

/// Compiles a CSS selector, reporting failures as plain text
pub fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector {:?}: {:?}", css, e))
}

/// Collects the text of an element with every text node trimmed and empty
/// nodes dropped, concatenated without separators
pub fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Returns true if the element carries the given class token
pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}
