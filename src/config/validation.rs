use crate::config::types::{CategoryEntry, Config, CrawlerConfig, OutputConfig, SiteConfig};
use crate::crawler::CrawlRequest;
use crate::{ConfigError, ScraperError};
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_categories(&config.categories)?;
    Ok(())
}

/// Validates a crawl request before any engine work starts
///
/// # Rules
///
/// - `start_page` must be at least 1
/// - `end_page` must be 0 (unbounded) or at least `start_page`
/// - the category slug must be well-formed
pub fn validate_request(request: &CrawlRequest) -> Result<(), ScraperError> {
    if request.start_page < 1 {
        return Err(ScraperError::InvalidRequest(
            "Start page must be >= 1".to_string(),
        ));
    }

    if request.end_page != 0 && request.end_page < request.start_page {
        return Err(ScraperError::InvalidRequest(format!(
            "End page must be >= start page (or 0), got {} < {}",
            request.end_page, request.start_page
        )));
    }

    validate_slug(&request.category)
        .map_err(|e| ScraperError::InvalidRequest(e.to_string()))?;

    Ok(())
}

/// Validates a category slug: non-empty, lowercase alphanumeric and hyphens
pub fn validate_slug(slug: &str) -> Result<(), ConfigError> {
    if slug.is_empty() {
        return Err(ConfigError::Validation(
            "Category slug cannot be empty".to_string(),
        ));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Category slug must contain only lowercase letters, digits and hyphens, got '{}'",
            slug
        )));
    }

    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.page_timeout_ms < 1 || config.article_timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "request timeouts must be >= 1ms, got page={}ms article={}ms",
            config.page_timeout_ms, config.article_timeout_ms
        )));
    }

    if config.max_consecutive_page_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "max-consecutive-page-failures must be >= 1, got {}",
            config.max_consecutive_page_failures
        )));
    }

    if config.empty_page_tolerance < 1 {
        return Err(ConfigError::Validation(format!(
            "empty-page-tolerance must be >= 1, got {}",
            config.empty_page_tolerance
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    if !config.delimiter.is_ascii() || config.delimiter == '"' || config.delimiter == '\n' {
        return Err(ConfigError::Validation(format!(
            "delimiter must be a single ASCII character other than a quote or newline, got {:?}",
            config.delimiter
        )));
    }

    Ok(())
}

fn validate_categories(categories: &[CategoryEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for entry in categories {
        validate_slug(&entry.slug)?;
        if !seen.insert(entry.slug.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate category slug '{}'",
                entry.slug
            )));
        }
    }
    Ok(())
}
