use serde::Deserialize;

/// Browser-like identification sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure for the scraper
///
/// Every section is optional in the TOML file; missing keys fall back to the
/// values in [`Config::default`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
    #[serde(rename = "category")]
    pub categories: Vec<CategoryEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            crawler: CrawlerConfig::default(),
            output: OutputConfig::default(),
            categories: default_categories(),
        }
    }
}

impl Config {
    /// Looks up a category by slug
    pub fn category(&self, slug: &str) -> Option<&CategoryEntry> {
        self.categories.iter().find(|c| c.slug == slug)
    }
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root that listing paths and relative article links resolve against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header value
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://spacebar.th".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Crawler timing and termination configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Timeout for a listing page request (milliseconds)
    #[serde(rename = "page-timeout-ms")]
    pub page_timeout_ms: u64,

    /// Timeout for an article page request (milliseconds)
    #[serde(rename = "article-timeout-ms")]
    pub article_timeout_ms: u64,

    /// Pause after a failed listing request before moving to the next page (milliseconds)
    #[serde(rename = "page-retry-backoff-ms")]
    pub page_retry_backoff_ms: u64,

    /// Pause after each processed article (milliseconds)
    #[serde(rename = "politeness-delay-ms")]
    pub politeness_delay_ms: u64,

    /// Number of listing failures in a row that ends the run
    #[serde(rename = "max-consecutive-page-failures")]
    pub max_consecutive_page_failures: u32,

    /// Number of pages in a row without a new article that ends the run
    #[serde(rename = "empty-page-tolerance")]
    pub empty_page_tolerance: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_timeout_ms: 20_000,
            article_timeout_ms: 15_000,
            page_retry_backoff_ms: 2_000,
            politeness_delay_ms: 500,
            max_consecutive_page_failures: 5,
            empty_page_tolerance: 1,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default CSV destination when none is given on the command line
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Field delimiter
    pub delimiter: char,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "spacebar_news.csv".to_string(),
            delimiter: ',',
        }
    }
}

/// A crawlable category
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CategoryEntry {
    /// URL slug (e.g. "politics")
    pub slug: String,

    /// Human readable label
    #[serde(default)]
    pub label: String,
}

fn default_categories() -> Vec<CategoryEntry> {
    [
        ("politics", "การเมือง (Politics)"),
        ("business", "ธุรกิจ (Business)"),
        ("social", "สังคม (Social)"),
        ("world", "โลก (World)"),
        ("culture", "วัฒนธรรม (Culture)"),
        ("lifestyle", "ไลฟ์สไตล์ (Lifestyle)"),
        ("sport", "กีฬา (Sport)"),
        ("deep-space", "Deep Space (บทความพิเศษ)"),
    ]
    .into_iter()
    .map(|(slug, label)| CategoryEntry {
        slug: slug.to_string(),
        label: label.to_string(),
    })
    .collect()
}
