//! Crawl engine and run handles
//!
//! The engine owns the HTTP client and starts runs on a dedicated tokio task.
//! The controller keeps a [`RunHandle`] to read events and to cancel.

use crate::config::{validate, validate_request, Config};
use crate::crawler::coordinator::{Coordinator, RunReport};
use crate::crawler::{build_http_client, CrawlRequest};
use crate::events::{self, Event, EventEmitter, EventReceiver};
use crate::output::ArticleSink;
use crate::state::CancelFlag;
use crate::url::parse_base;
use crate::ScraperError;
use futures::FutureExt;
use reqwest::Client;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use url::Url;

/// Starts crawl runs; at most one run is active at a time
pub struct CrawlEngine {
    config: Arc<Config>,
    client: Client,
    base: Url,
    active: Arc<AtomicBool>,
}

impl CrawlEngine {
    /// Creates an engine from a configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlEngine)` - Configuration valid and HTTP client built
    /// * `Err(ScraperError)` - Invalid configuration or client failure
    pub fn new(config: Config) -> Result<Self, ScraperError> {
        validate(&config)?;
        let base = parse_base(&config.site.base_url)?;
        let client = build_http_client(&config.site)?;

        Ok(Self {
            config: Arc::new(config),
            client,
            base,
            active: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns true while a run started by this engine is still going
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Validates the request and starts a run on a new tokio task
    ///
    /// Must be called from within a tokio runtime. The request is checked
    /// before anything is spawned, so an invalid page range never reaches
    /// the network.
    ///
    /// # Returns
    ///
    /// * `Ok(RunHandle)` - The run has started
    /// * `Err(ScraperError::InvalidRequest)` - The request was rejected
    /// * `Err(ScraperError::RunInProgress)` - Another run is still active
    ///
    /// # Example
    ///
    /// ```no_run
    /// use spacebar_scraper::{Config, CrawlEngine, CrawlRequest, CsvSink, Event};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let engine = CrawlEngine::new(Config::default())?;
    /// let request = CrawlRequest::new("politics", 1, 2);
    /// let mut handle = engine.start(request, CsvSink::new("politics.csv"))?;
    ///
    /// while let Some(event) = handle.next_event().await {
    ///     if let Event::Done { summary, .. } = event {
    ///         println!("{}", summary);
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn start<S>(&self, request: CrawlRequest, sink: S) -> Result<RunHandle, ScraperError>
    where
        S: ArticleSink + 'static,
    {
        validate_request(&request)?;

        if self.active.swap(true, Ordering::SeqCst) {
            return Err(ScraperError::RunInProgress);
        }
        let guard = ActiveGuard(Arc::clone(&self.active));

        let cancel = CancelFlag::new();
        let (emitter, receiver) = events::channel();
        let coordinator = Coordinator::new(
            Arc::clone(&self.config),
            self.client.clone(),
            self.base.clone(),
            request,
            cancel.clone(),
        );

        let task = tokio::spawn(run_worker(coordinator, sink, emitter, guard));

        Ok(RunHandle {
            cancel,
            events: receiver,
            task,
        })
    }
}

/// Clears the engine's active flag when the worker finishes, even on panic
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Worker body: runs the coordinator and always ends with exactly one Done event
async fn run_worker<S: ArticleSink>(
    mut coordinator: Coordinator,
    mut sink: S,
    events: EventEmitter,
    guard: ActiveGuard,
) -> Option<RunReport> {
    let outcome = AssertUnwindSafe(coordinator.run(&mut sink, &events))
        .catch_unwind()
        .await;

    // Release the engine before the observer can see Done.
    drop(guard);

    match outcome {
        Ok(Ok(report)) => {
            events.finish(report.is_success(), report.summary());
            Some(report)
        }
        Ok(Err(e)) => {
            tracing::error!("Crawl failed: {}", e);
            events.log(format!("[CRITICAL ERROR] {}", e));
            events.finish(false, format!("Critical Error: {}", e));
            None
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("Crawl worker panicked: {}", message);
            events.log(format!("[CRITICAL ERROR] {}", message));
            events.finish(false, format!("Critical Error: {}", message));
            None
        }
    }
}

/// Controller side of a running crawl
pub struct RunHandle {
    cancel: CancelFlag,
    events: EventReceiver,
    task: JoinHandle<Option<RunReport>>,
}

impl RunHandle {
    /// Requests cancellation
    ///
    /// Idempotent; calling it after the run finished has no effect.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns a clone of the cancellation flag, for use from another task
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Waits for the next event; `None` once the run is over and drained
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Returns the next event if one is already queued
    pub fn try_next_event(&mut self) -> Option<Event> {
        self.events.try_recv().ok()
    }

    /// Receives events up to and including the terminal one
    pub async fn collect_events(&mut self) -> Vec<Event> {
        let mut collected = Vec::new();
        while let Some(event) = self.events.recv().await {
            let terminal = event.is_terminal();
            collected.push(event);
            if terminal {
                break;
            }
        }
        collected
    }

    /// Returns true once the worker task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the worker and returns its report
    ///
    /// `None` when the run ended with a critical error.
    pub async fn wait(self) -> Option<RunReport> {
        self.task.await.ok().flatten()
    }
}
