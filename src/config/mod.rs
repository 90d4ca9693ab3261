//! Configuration module for the scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A missing file is not required: [`Config::default`] targets the public site.
//!
//! # Example
//!
//! ```no_run
//! use spacebar_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Listing timeout: {}ms", config.crawler.page_timeout_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CategoryEntry, Config, CrawlerConfig, OutputConfig, SiteConfig, DEFAULT_USER_AGENT,
};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, validate_request, validate_slug};
