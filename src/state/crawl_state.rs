use crate::config::CrawlerConfig;
use crate::crawler::CrawlRequest;
use crate::state::StopReason;

/// Mutable bookkeeping of the pagination loop
///
/// Only the worker running the crawl touches this structure. Each listing
/// page ends in exactly one of `record_page_failure` or `record_page_yield`,
/// which either advance the cursor or return the reason to stop.
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// Page number currently being processed
    pub current_page: u32,

    /// Articles accepted so far in this run
    pub total_found: usize,

    /// Set once the loop observed a cancellation request
    pub cancelled: bool,

    start_page: u32,
    end_page: u32,
    consecutive_failures: u32,
    empty_streak: u32,
    max_consecutive_failures: u32,
    empty_page_tolerance: u32,
}

impl CrawlState {
    /// Creates the state for a validated request
    pub fn new(request: &CrawlRequest, config: &CrawlerConfig) -> Self {
        Self {
            current_page: request.start_page,
            total_found: 0,
            cancelled: false,
            start_page: request.start_page,
            end_page: request.end_page,
            consecutive_failures: 0,
            empty_streak: 0,
            max_consecutive_failures: config.max_consecutive_page_failures.max(1),
            empty_page_tolerance: config.empty_page_tolerance.max(1),
        }
    }

    /// Returns `BoundReached` once the cursor has moved past a nonzero end page
    pub fn check_bound(&self) -> Option<StopReason> {
        if self.end_page != 0 && self.current_page > self.end_page {
            Some(StopReason::BoundReached)
        } else {
            None
        }
    }

    /// Marks the run as cancelled
    pub fn cancel(&mut self) -> StopReason {
        self.cancelled = true;
        StopReason::Cancelled
    }

    /// Progress for the current page as `(done, total)`
    ///
    /// `total` is `None` when the run has no end page.
    pub fn progress(&self) -> (u32, Option<u32>) {
        if self.end_page == 0 {
            (0, None)
        } else {
            (
                self.current_page.saturating_sub(self.start_page),
                Some(self.end_page - self.start_page + 1),
            )
        }
    }

    /// Records one accepted article and returns the running total
    pub fn record_article(&mut self) -> usize {
        self.total_found += 1;
        self.total_found
    }

    /// Records a failed listing request and advances to the next page
    ///
    /// Returns `TooManyFailures` when the configured number of failures in
    /// a row has been reached.
    pub fn record_page_failure(&mut self) -> Option<StopReason> {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.max_consecutive_failures {
            return Some(StopReason::TooManyFailures);
        }
        self.current_page += 1;
        None
    }

    /// Records how many new articles a listing page yielded
    ///
    /// A page with new articles resets the empty streak and advances the
    /// cursor. A page without any counts towards the tolerance; once the
    /// tolerance is reached the loop stops with `NoNewArticles`.
    pub fn record_page_yield(&mut self, new_articles: usize) -> Option<StopReason> {
        self.consecutive_failures = 0;
        if new_articles == 0 {
            self.empty_streak += 1;
            if self.empty_streak >= self.empty_page_tolerance {
                return Some(StopReason::NoNewArticles);
            }
        } else {
            self.empty_streak = 0;
        }
        self.current_page += 1;
        None
    }

    /// Consecutive listing failures so far
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
