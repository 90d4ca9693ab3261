use std::collections::HashSet;

/// URLs already accepted during the current run
///
/// The set only grows. A URL is inserted before its article is fetched, so a
/// failed fetch is never retried later in the same run.
#[derive(Debug, Default)]
pub struct SeenSet {
    urls: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL, returning false if it was already present
    pub fn insert(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    /// Number of distinct URLs accepted so far
    pub fn count(&self) -> usize {
        self.urls.len()
    }
}
