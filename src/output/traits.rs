//! Output sink trait and errors
//!
//! A sink receives the full list of collected articles once, when the run
//! finishes. Sinks are moved into the crawl worker, so they must be `Send`.

use crate::crawler::Article;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Column names of an article record, in write order
pub const ARTICLE_COLUMNS: [&str; 4] = ["title", "body", "published", "url"];

/// Destination for the articles collected by a run
pub trait ArticleSink: Send {
    /// Writes all articles in order
    ///
    /// Called at most once per run, and only with a non-empty slice.
    fn write_articles(&mut self, articles: &[Article]) -> OutputResult<()>;

    /// Short description of the destination for log and summary lines
    fn describe(&self) -> String;
}

impl<S: ArticleSink + ?Sized> ArticleSink for Box<S> {
    fn write_articles(&mut self, articles: &[Article]) -> OutputResult<()> {
        (**self).write_articles(articles)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
