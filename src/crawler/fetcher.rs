//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the HTTP client with a browser User-Agent
//! - GET requests with a per-request timeout
//! - Error classification for log lines

use crate::config::SiteConfig;
use reqwest::Client;
use std::fmt;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body, decoded as UTF-8
        body: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// The request did not complete within its timeout
    Timeout,

    /// Network error (connection refused, DNS failure, broken body, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success {
                status_code, body, ..
            } => write!(f, "HTTP {} ({} bytes)", status_code, body.len()),
            Self::HttpError { status_code } => {
                let reason = reqwest::StatusCode::from_u16(*status_code)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("");
                write!(f, "HTTP {} {}", status_code, reason)
            }
            Self::Timeout => write!(f, "Request timeout"),
            Self::NetworkError { error } => write!(f, "{}", error),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client keeps one connection pool for the whole run. Request timeouts
/// are set per request by [`fetch_url`].
///
/// # Example
///
/// ```no_run
/// use spacebar_scraper::config::SiteConfig;
/// use spacebar_scraper::crawler::build_http_client;
///
/// let client = build_http_client(&SiteConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &SiteConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with a bounded timeout
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 2xx | `Success`, body decoded as UTF-8 (invalid bytes replaced) |
/// | Other HTTP status | `HttpError` |
/// | Timeout (connect, headers or body) | `Timeout` |
/// | Any other transport failure | `NetworkError` |
pub async fn fetch_url(client: &Client, url: &str, timeout: Duration) -> FetchResult {
    let response = match client.get(url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(e),
    };

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    // The site serves UTF-8 regardless of what the headers claim.
    match response.bytes().await {
        Ok(bytes) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        },
        Err(e) => classify_error(e),
    }
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::Timeout
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("Connection failed: {}", e),
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
        }
    }
}
