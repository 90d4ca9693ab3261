//! Crawler coordinator - the pagination loop of one run
//!
//! This module contains the loop that walks a category page by page:
//! - Fetching listing pages and extracting article teasers
//! - Filtering and deduplicating candidate links
//! - Fetching and parsing each new article
//! - Deciding when the run ends
//! - Writing the collected articles to the sink
//!
//! Everything runs sequentially on the worker that owns the coordinator.
//! Cancellation is checked before each listing page and before each
//! candidate link.

use crate::config::Config;
use crate::crawler::article::{parse_article, Article};
use crate::crawler::listing::{parse_listing, to_candidate, ListingEntry};
use crate::crawler::{fetch_url, CrawlRequest, FetchResult};
use crate::events::EventEmitter;
use crate::output::ArticleSink;
use crate::state::{CancelFlag, CrawlState, SeenSet, StopReason};
use crate::url::listing_url;
use crate::ScraperError;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Characters of the title shown in per-article log lines
const TITLE_PREVIEW_CHARS: usize = 40;

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Why the pagination loop ended
    pub stop_reason: StopReason,

    /// Articles collected, in the order they were accepted
    pub articles: Vec<Article>,

    /// Listing pages requested, including failed ones
    pub pages_visited: u32,

    /// Wall time of the run
    pub elapsed: Duration,

    /// Sink description, when articles were written
    pub destination: Option<String>,
}

impl RunReport {
    /// A run succeeds when it collected and wrote at least one article
    pub fn is_success(&self) -> bool {
        !self.articles.is_empty()
    }

    /// Human readable summary for the terminal event
    pub fn summary(&self) -> String {
        let elapsed = self.elapsed.as_secs_f64();
        match (&self.destination, self.articles.len()) {
            (Some(destination), count) if count > 0 => format!(
                "Saved successfully: {}\nTotal Articles: {}\nTime: {:.2}s",
                destination, count, elapsed
            ),
            _ => format!("No articles found.\nTime: {:.2}s", elapsed),
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    base: Url,
    request: CrawlRequest,
    cancel: CancelFlag,
    state: CrawlState,
    seen: SeenSet,
    articles: Vec<Article>,
    pages_visited: u32,
}

impl Coordinator {
    /// Creates a coordinator for one validated request
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `client` - HTTP client owned by the run
    /// * `base` - Site root for listing URLs and relative links
    /// * `request` - Category and page range
    /// * `cancel` - Flag shared with the controller
    pub fn new(
        config: Arc<Config>,
        client: Client,
        base: Url,
        request: CrawlRequest,
        cancel: CancelFlag,
    ) -> Self {
        let state = CrawlState::new(&request, &config.crawler);
        Self {
            config,
            client,
            base,
            request,
            cancel,
            state,
            seen: SeenSet::new(),
            articles: Vec::new(),
            pages_visited: 0,
        }
    }

    /// Runs the crawl and writes the result
    ///
    /// Page and item failures are logged and skipped. An `Err` is only
    /// returned for failures that make the run itself fail, such as the
    /// sink refusing the write.
    pub async fn run(
        &mut self,
        sink: &mut dyn ArticleSink,
        events: &EventEmitter,
    ) -> Result<RunReport, ScraperError> {
        let start_time = Instant::now();

        let range_end = if self.request.is_unbounded() {
            "until end".to_string()
        } else {
            self.request.end_page.to_string()
        };
        events.log(format!(
            "--- Start scraping: {} (page {} - {}) ---",
            self.request.category, self.request.start_page, range_end
        ));
        tracing::info!(
            category = %self.request.category,
            start_page = self.request.start_page,
            end_page = self.request.end_page,
            "Starting crawl run"
        );

        let stop_reason = self.crawl_pages(events).await?;
        if stop_reason.is_natural_end() {
            tracing::info!(
                "Pagination finished ({}) after {} pages, {} links seen, {} articles",
                stop_reason,
                self.pages_visited,
                self.seen.count(),
                self.articles.len()
            );
        } else {
            tracing::warn!(
                "Pagination interrupted ({}) after {} pages, {} links seen, {} articles",
                stop_reason,
                self.pages_visited,
                self.seen.count(),
                self.articles.len()
            );
        }

        self.finalize(stop_reason, start_time, sink, events)
    }

    /// Walks listing pages until a stop condition is met
    async fn crawl_pages(&mut self, events: &EventEmitter) -> Result<StopReason, ScraperError> {
        let page_timeout = Duration::from_millis(self.config.crawler.page_timeout_ms);
        let backoff = Duration::from_millis(self.config.crawler.page_retry_backoff_ms);

        loop {
            if self.cancel.is_cancelled() {
                events.log("[Info] Cancellation requested. Stopping.");
                return Ok(self.state.cancel());
            }

            if let Some(reason) = self.state.check_bound() {
                return Ok(reason);
            }

            let page = self.state.current_page;
            events.status(format!("Processing page {}...", page));
            let (done, total) = self.state.progress();
            events.progress(done, total);

            let page_url = listing_url(&self.base, &self.request.category, page)?;
            events.log(format!("Loading Page: {}", page_url));
            self.pages_visited += 1;

            let body = match fetch_url(&self.client, page_url.as_str(), page_timeout).await {
                FetchResult::Success { body, .. } => body,
                failure => {
                    tracing::warn!("Listing page {} failed ({}): {}", page, page_url, failure);
                    events.log(format!(
                        "[Error] Failed page {}: {} ({})",
                        page, failure, page_url
                    ));

                    if let Some(reason) = self.state.record_page_failure() {
                        events.log(format!(
                            "[Error] {} listing pages failed in a row. Stopping.",
                            self.state.consecutive_failures()
                        ));
                        return Ok(reason);
                    }

                    tokio::time::sleep(backoff).await;
                    continue;
                }
            };

            let entries = parse_listing(&body);
            if entries.is_empty() {
                events.log(format!("[Info] No more news at page {}. Stopping.", page));
                return Ok(StopReason::PageEmpty);
            }
            tracing::debug!("Page {}: {} article links", page, entries.len());

            let found = self.process_entries(&entries, events).await;
            events.log(format!(
                "[Summary] Page {}: Found {} new articles",
                page, found
            ));

            if self.cancel.is_cancelled() {
                events.log("[Info] Cancellation requested. Stopping.");
                return Ok(self.state.cancel());
            }

            if found == 0 {
                events.log(format!("[Info] No items matched criteria on page {}.", page));
            }

            if let Some(reason) = self.state.record_page_yield(found) {
                return Ok(reason);
            }
        }
    }

    /// Processes the teasers of one listing page, returning how many new
    /// articles were collected
    async fn process_entries(&mut self, entries: &[ListingEntry], events: &EventEmitter) -> usize {
        let mut found = 0;

        for (idx, entry) in entries.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }

            match self.process_entry(entry, events).await {
                Ok(true) => found += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Item {} on page {} failed: {}", idx + 1, self.state.current_page, e);
                    events.log(format!("  [Error] Parsing item {}: {}", idx + 1, e));
                }
            }
        }

        found
    }

    /// Filters, deduplicates, fetches and parses one teaser
    ///
    /// Returns `Ok(true)` when a new article was collected.
    async fn process_entry(
        &mut self,
        entry: &ListingEntry,
        events: &EventEmitter,
    ) -> Result<bool, ScraperError> {
        let candidate = match to_candidate(entry, &self.base, &self.request.category)? {
            Some(candidate) => candidate,
            None => {
                tracing::debug!("Skipping out-of-category link {:?}", entry.href);
                return Ok(false);
            }
        };

        if !self.seen.insert(&candidate.absolute_url) {
            tracing::debug!("Skipping already seen {}", candidate.absolute_url);
            return Ok(false);
        }

        let article_timeout = Duration::from_millis(self.config.crawler.article_timeout_ms);
        let body = match fetch_url(&self.client, &candidate.absolute_url, article_timeout).await {
            FetchResult::Success { body, .. } => body,
            failure => {
                tracing::warn!("Article {} failed: {}", candidate.absolute_url, failure);
                events.log(format!(
                    "  [Skip] Content load failed: {} ({})",
                    candidate.absolute_url, failure
                ));
                return Ok(false);
            }
        };

        let article = parse_article(&body, &candidate)?;
        let total = self.state.record_article();
        let preview: String = article.title.chars().take(TITLE_PREVIEW_CHARS).collect();
        events.log(format!("  + [{}] {}... | {}", total, preview, article.published));
        self.articles.push(article);

        tokio::time::sleep(Duration::from_millis(self.config.crawler.politeness_delay_ms)).await;
        Ok(true)
    }

    /// Writes collected articles and builds the run report
    fn finalize(
        &mut self,
        stop_reason: StopReason,
        start_time: Instant,
        sink: &mut dyn ArticleSink,
        events: &EventEmitter,
    ) -> Result<RunReport, ScraperError> {
        let destination = if self.articles.is_empty() {
            None
        } else {
            events.status("Saving...");
            sink.write_articles(&self.articles)?;
            Some(sink.describe())
        };

        let report = RunReport {
            stop_reason,
            articles: std::mem::take(&mut self.articles),
            pages_visited: self.pages_visited,
            elapsed: start_time.elapsed(),
            destination,
        };

        let summary = report.summary();
        if report.is_success() {
            events.log(format!(">>> {}", summary.replace('\n', " | ")));
        } else {
            events.log(summary.replace('\n', " | "));
        }
        tracing::info!("{}", summary.replace('\n', ", "));

        Ok(report)
    }
}
