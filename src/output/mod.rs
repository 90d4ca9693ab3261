//! Output module for persisting collected articles
//!
//! This module handles:
//! - The [`ArticleSink`] trait the engine writes through
//! - CSV output with a header row and UTF-8 BOM

mod csv_output;
mod traits;

pub use csv_output::CsvSink;
pub use traits::{ArticleSink, OutputError, OutputResult, ARTICLE_COLUMNS};
