//! CSV article sink
//!
//! Writes a header row followed by one row per article. The file starts with
//! a UTF-8 byte order mark so spreadsheet tools pick the right encoding for
//! Thai text.

use crate::crawler::Article;
use crate::output::traits::{ArticleSink, OutputResult, ARTICLE_COLUMNS};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes articles to a CSV file
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    delimiter: u8,
    bom: bool,
}

impl CsvSink {
    /// Creates a comma-delimited sink with a byte order mark
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            bom: true,
        }
    }

    /// Sets the field delimiter
    ///
    /// Non-ASCII characters fall back to a comma.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = if delimiter.is_ascii() {
            delimiter as u8
        } else {
            b','
        };
        self
    }

    /// Enables or disables the leading byte order mark
    pub fn with_bom(mut self, bom: bool) -> Self {
        self.bom = bom;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the header and all articles to any writer
    pub fn write_to<W: Write>(&self, mut out: W, articles: &[Article]) -> OutputResult<()> {
        if self.bom {
            out.write_all(UTF8_BOM)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(out);

        writer.write_record(ARTICLE_COLUMNS)?;
        for article in articles {
            writer.serialize(article)?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl ArticleSink for CsvSink {
    fn write_articles(&mut self, articles: &[Article]) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&self.path)?;
        self.write_to(BufWriter::new(file), articles)?;

        tracing::info!(
            "Wrote {} articles to {}",
            articles.len(),
            self.path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
