//! Crawler module for category traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with per-request timeouts
//! - Listing page parsing and candidate filtering
//! - Article page extraction
//! - The pagination loop and run finalization
//! - The engine that starts runs and the handle that controls them

mod article;
mod coordinator;
mod dom;
mod engine;
mod fetcher;
mod listing;

pub use article::{parse_article, Article, NO_DATE};
pub use coordinator::{Coordinator, RunReport};
pub use engine::{CrawlEngine, RunHandle};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use listing::{parse_listing, to_candidate, CandidateLink, ListingEntry, NO_HEADLINE};

/// What to crawl: one category over a page range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Category slug, e.g. "politics"
    pub category: String,

    /// First listing page, at least 1
    pub start_page: u32,

    /// Last listing page, or 0 to continue until the category ends
    pub end_page: u32,
}

impl CrawlRequest {
    pub fn new(category: impl Into<String>, start_page: u32, end_page: u32) -> Self {
        Self {
            category: category.into(),
            start_page,
            end_page,
        }
    }

    /// Returns true when the run has no end page
    pub fn is_unbounded(&self) -> bool {
        self.end_page == 0
    }
}
