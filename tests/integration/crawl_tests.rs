//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing and article pages and drive
//! complete runs through the engine, observing them via the event channel.

use spacebar_scraper::config::Config;
use spacebar_scraper::output::{OutputError, OutputResult};
use spacebar_scraper::{
    Article, ArticleSink, CrawlEngine, CrawlRequest, CsvSink, Event, ScraperError, StopReason,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sink that keeps articles in memory and counts writes
#[derive(Clone, Default)]
struct MemorySink {
    articles: Arc<Mutex<Vec<Article>>>,
    writes: Arc<AtomicUsize>,
}

impl ArticleSink for MemorySink {
    fn write_articles(&mut self, articles: &[Article]) -> OutputResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.articles.lock().unwrap().extend_from_slice(articles);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Sink that always fails
struct FailingSink;

impl ArticleSink for FailingSink {
    fn write_articles(&mut self, _articles: &[Article]) -> OutputResult<()> {
        Err(OutputError::Write("disk full".to_string()))
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}

/// Creates a test configuration pointed at the mock server with short delays
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.crawler.page_timeout_ms = 2_000;
    config.crawler.article_timeout_ms = 2_000;
    config.crawler.page_retry_backoff_ms = 10;
    config.crawler.politeness_delay_ms = 0;
    config
}

/// Listing page with one article anchor per href
fn listing_page(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .enumerate()
        .map(|(i, href)| {
            format!(
                r#"<a aria-label="articleLink" href="{}"><h3>Headline {}</h3></a>"#,
                href,
                i + 1
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="grid">{}</div></body></html>"#,
        anchors
    )
}

/// Listing page without any article anchors
fn empty_listing_page() -> String {
    r#"<html><body><p>ไม่พบบทความ</p></body></html>"#.to_string()
}

fn article_page(title: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="article-title">{title}</h1>
            <p class="text-gray-400 text-subheadsm mb-4 md:mb-0">1 ม.ค. 2567</p>
            <div class="payload-richtext">
                <p>First paragraph of {title}</p>
                <p>Second paragraph</p>
            </div>
        </body></html>"#
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_articles(server: &MockServer, paths: &[&str]) {
    for article_path in paths {
        mount_page(server, article_path, article_page(article_path)).await;
    }
}

fn log_lines(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Log(line) => Some(line.clone()),
            _ => None,
        })
        .collect()
}

fn position(lines: &[String], needle: &str) -> usize {
    lines
        .iter()
        .position(|line| line.contains(needle))
        .unwrap_or_else(|| panic!("no log line containing {:?} in {:#?}", needle, lines))
}

fn assert_single_done_last(events: &[Event]) -> (bool, String) {
    let done: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(done.len(), 1, "expected exactly one Done event");
    match events.last() {
        Some(Event::Done { success, summary }) => (*success, summary.clone()),
        other => panic!("last event is not Done: {:?}", other),
    }
}

#[tokio::test]
async fn test_single_page_writes_csv() {
    let mock_server = MockServer::start().await;
    let articles = ["/politics/story-1", "/politics/story-2", "/politics/story-3"];

    mount_page(&mock_server, "/category/politics", listing_page(&articles)).await;
    mount_articles(&mock_server, &articles).await;
    Mock::given(method("GET"))
        .and(path("/category/politics/page/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let csv_path = dir.path().join("politics.csv");

    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("politics", 1, 1), CsvSink::new(&csv_path))
        .unwrap();

    let events = handle.collect_events().await;
    let report = handle.wait().await.expect("run should produce a report");

    let (success, summary) = assert_single_done_last(&events);
    assert!(success);
    assert!(summary.contains("Total Articles: 3"));
    assert_eq!(report.articles.len(), 3);
    assert_eq!(report.stop_reason, StopReason::BoundReached);

    let bytes = std::fs::read(&csv_path).unwrap();
    let content = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap();
    let mut reader = csv::Reader::from_reader(content);
    let headers: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(headers, vec!["title", "body", "published", "url"]);
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], "/politics/story-1");
    assert_eq!(
        &rows[0][1],
        "First paragraph of /politics/story-1\n\nSecond paragraph"
    );
    assert_eq!(&rows[0][2], "1 ม.ค. 2567");
    assert_eq!(
        &rows[0][3],
        format!("{}/politics/story-1", mock_server.uri())
    );
}

#[tokio::test]
async fn test_unbounded_run_stops_at_empty_page() {
    let mock_server = MockServer::start().await;
    let articles = [
        "/business/a",
        "/business/b",
        "/business/c",
        "/business/d",
        "/business/e",
    ];

    mount_page(&mock_server, "/category/business", listing_page(&articles)).await;
    mount_page(&mock_server, "/category/business/page/2", empty_listing_page()).await;
    mount_articles(&mock_server, &articles).await;
    Mock::given(method("GET"))
        .and(path("/category/business/page/3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let sink = MemorySink::default();
    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("business", 1, 0), sink.clone())
        .unwrap();

    let events = handle.collect_events().await;
    let report = handle.wait().await.unwrap();

    let (success, _) = assert_single_done_last(&events);
    assert!(success);
    assert_eq!(report.stop_reason, StopReason::PageEmpty);
    assert_eq!(report.pages_visited, 2);
    assert_eq!(sink.articles.lock().unwrap().len(), 5);

    let lines = log_lines(&events);
    position(&lines, "[Info] No more news at page 2. Stopping.");

    // Unbounded runs report indeterminate progress
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Progress { total: None, .. })));
}

#[tokio::test]
async fn test_listing_timeout_moves_to_next_page() {
    let mock_server = MockServer::start().await;
    let articles = ["/world/x", "/world/y"];

    Mock::given(method("GET"))
        .and(path("/category/world/page/3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&["/world/never"]))
                .set_delay(Duration::from_millis(1_500)),
        )
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/category/world/page/4", listing_page(&articles)).await;
    mount_page(&mock_server, "/category/world/page/5", empty_listing_page()).await;
    mount_articles(&mock_server, &articles).await;

    let mut config = create_test_config(&mock_server.uri());
    config.crawler.page_timeout_ms = 300;

    let sink = MemorySink::default();
    let engine = CrawlEngine::new(config).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("world", 3, 0), sink.clone())
        .unwrap();

    let events = handle.collect_events().await;
    let report = handle.wait().await.unwrap();

    let (success, _) = assert_single_done_last(&events);
    assert!(success);
    assert_eq!(report.articles.len(), 2);

    let lines = log_lines(&events);
    let failure = position(&lines, "[Error] Failed page 3: Request timeout");
    let next_page = position(&lines, "/category/world/page/4");
    assert!(failure < next_page);
}

#[tokio::test]
async fn test_no_new_articles_fails_without_writing() {
    let mock_server = MockServer::start().await;

    // Only links into other categories
    mount_page(
        &mock_server,
        "/category/politics",
        listing_page(&["/business/a", "/sport/b"]),
    )
    .await;

    let sink = MemorySink::default();
    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("politics", 1, 0), sink.clone())
        .unwrap();

    let events = handle.collect_events().await;
    let report = handle.wait().await.unwrap();

    let (success, summary) = assert_single_done_last(&events);
    assert!(!success);
    assert!(summary.contains("No articles found."));
    assert_eq!(report.stop_reason, StopReason::NoNewArticles);
    assert_eq!(sink.writes.load(Ordering::SeqCst), 0);

    let lines = log_lines(&events);
    position(&lines, "[Info] No items matched criteria on page 1.");
}

#[tokio::test]
async fn test_duplicates_across_pages_fetched_once() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/category/social",
        listing_page(&["/social/a", "/social/b", "/social/a"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/category/social/page/2",
        listing_page(&["/social/b", "/social/c"]),
    )
    .await;
    mount_articles(&mock_server, &["/social/a", "/social/c"]).await;
    Mock::given(method("GET"))
        .and(path("/social/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("b")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("social", 1, 2), MemorySink::default())
        .unwrap();

    handle.collect_events().await;
    let report = handle.wait().await.unwrap();

    let mut urls: Vec<_> = report.articles.iter().map(|a| a.url.clone()).collect();
    assert_eq!(urls.len(), 3);
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), 3);
}

#[tokio::test]
async fn test_highlight_block_not_collected() {
    let mock_server = MockServer::start().await;

    let listing = r#"
        <html><body>
            <div class="w-full">
                <h2>เรื่องเด่นประจำวัน</h2>
                <a aria-label="articleLink" href="/culture/featured"><h3>Featured</h3></a>
            </div>
            <a aria-label="latestArticleLink" href="/culture/regular"><h3>Regular</h3></a>
        </body></html>
    "#;
    mount_page(&mock_server, "/category/culture", listing.to_string()).await;
    mount_articles(&mock_server, &["/culture/regular"]).await;
    Mock::given(method("GET"))
        .and(path("/culture/featured"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("featured")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("culture", 1, 1), MemorySink::default())
        .unwrap();

    handle.collect_events().await;
    let report = handle.wait().await.unwrap();
    assert_eq!(report.articles.len(), 1);
    assert!(report.articles[0].url.ends_with("/culture/regular"));
}

#[tokio::test]
async fn test_failed_article_is_skipped() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/category/sport",
        listing_page(&["/sport/missing", "/sport/ok"]),
    )
    .await;
    mount_articles(&mock_server, &["/sport/ok"]).await;
    Mock::given(method("GET"))
        .and(path("/sport/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("sport", 1, 1), MemorySink::default())
        .unwrap();

    let events = handle.collect_events().await;
    let report = handle.wait().await.unwrap();

    assert_eq!(report.articles.len(), 1);
    let lines = log_lines(&events);
    let skip = position(&lines, "[Skip] Content load failed");
    assert!(lines[skip].contains("/sport/missing"));
    assert!(lines[skip].contains("404"));
}

#[tokio::test]
async fn test_unresolvable_link_is_skipped() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/category/politics",
        listing_page(&["http://[::1", "/politics/valid"]),
    )
    .await;
    mount_articles(&mock_server, &["/politics/valid"]).await;

    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("politics", 1, 1), MemorySink::default())
        .unwrap();

    let events = handle.collect_events().await;
    let report = handle.wait().await.unwrap();

    let (success, _) = assert_single_done_last(&events);
    assert!(success);
    assert_eq!(report.articles.len(), 1);
    assert!(report.articles[0].url.ends_with("/politics/valid"));

    let lines = log_lines(&events);
    let error = position(&lines, "[Error] Parsing item 1:");
    let collected = position(&lines, "+ [1]");
    assert!(error < collected);
}

#[tokio::test]
async fn test_invalid_range_rejected_before_any_request() {
    let mock_server = MockServer::start().await;
    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();

    let result = engine.start(CrawlRequest::new("politics", 5, 3), MemorySink::default());
    assert!(matches!(result, Err(ScraperError::InvalidRequest(_))));

    let result = engine.start(CrawlRequest::new("politics", 0, 0), MemorySink::default());
    assert!(matches!(result, Err(ScraperError::InvalidRequest(_))));

    assert!(!engine.is_running());
    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_stops_run_and_keeps_collected() {
    let mock_server = MockServer::start().await;
    let articles: Vec<String> = (1..=10).map(|i| format!("/lifestyle/{}", i)).collect();
    let article_refs: Vec<&str> = articles.iter().map(String::as_str).collect();

    mount_page(&mock_server, "/category/lifestyle", listing_page(&article_refs)).await;
    for article_path in &article_refs {
        Mock::given(method("GET"))
            .and(path(*article_path))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(article_page(article_path))
                    .set_delay(Duration::from_millis(100)),
            )
            .mount(&mock_server)
            .await;
    }

    let sink = MemorySink::default();
    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("lifestyle", 1, 0), sink.clone())
        .unwrap();

    // Cancel as soon as the first article is reported
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        let first_article = matches!(&event, Event::Log(line) if line.contains("+ [1]"));
        events.push(event);
        if first_article {
            handle.cancel();
            break;
        }
    }
    events.extend(handle.collect_events().await);

    let (success, _) = assert_single_done_last(&events);
    assert!(success);
    assert!(handle.try_next_event().is_none());

    let report = handle.wait().await.unwrap();
    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert!(report.articles.len() < 10);

    // At most the article in flight when cancel was requested follows the first
    let article_requests = mock_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().starts_with("/lifestyle/"))
        .count();
    assert!(article_requests <= 3, "{} article requests", article_requests);
    assert_eq!(sink.articles.lock().unwrap().len(), report.articles.len());
}

#[tokio::test]
async fn test_cancel_is_idempotent_after_completion() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/category/politics", empty_listing_page()).await;

    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("politics", 1, 0), MemorySink::default())
        .unwrap();

    let events = handle.collect_events().await;
    assert_single_done_last(&events);

    handle.cancel();
    handle.cancel();
    let flag = handle.cancel_flag();
    flag.cancel();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.stop_reason, StopReason::PageEmpty);
}

#[tokio::test]
async fn test_one_active_run_per_engine() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/category/world"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(empty_listing_page())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut first = engine
        .start(CrawlRequest::new("world", 1, 0), MemorySink::default())
        .unwrap();

    assert!(engine.is_running());
    let second = engine.start(CrawlRequest::new("world", 1, 0), MemorySink::default());
    assert!(matches!(second, Err(ScraperError::RunInProgress)));

    first.collect_events().await;
    assert!(!engine.is_running());

    let mut third = engine
        .start(CrawlRequest::new("world", 1, 0), MemorySink::default())
        .unwrap();
    let events = third.collect_events().await;
    assert_single_done_last(&events);
}

#[tokio::test]
async fn test_consecutive_listing_failures_end_run() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.crawler.max_consecutive_page_failures = 3;

    let engine = CrawlEngine::new(config).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("politics", 1, 0), MemorySink::default())
        .unwrap();

    let events = handle.collect_events().await;
    let report = handle.wait().await.unwrap();

    let (success, _) = assert_single_done_last(&events);
    assert!(!success);
    assert_eq!(report.stop_reason, StopReason::TooManyFailures);
    assert_eq!(report.pages_visited, 3);

    let lines = log_lines(&events);
    for page in 1..=3 {
        position(&lines, &format!("[Error] Failed page {}: HTTP 500", page));
    }
}

#[tokio::test]
async fn test_sink_failure_reported_as_done() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/category/politics",
        listing_page(&["/politics/a"]),
    )
    .await;
    mount_articles(&mock_server, &["/politics/a"]).await;

    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("politics", 1, 1), FailingSink)
        .unwrap();

    let events = handle.collect_events().await;
    let (success, summary) = assert_single_done_last(&events);
    assert!(!success);
    assert!(summary.starts_with("Critical Error:"));
    assert!(summary.contains("disk full"));

    assert!(handle.wait().await.is_none());
    assert!(!engine.is_running());
}

#[tokio::test]
async fn test_progress_is_determinate_for_bounded_runs() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/category/politics/page/2",
        listing_page(&["/politics/a"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/category/politics/page/3",
        listing_page(&["/politics/b"]),
    )
    .await;
    mount_articles(&mock_server, &["/politics/a", "/politics/b"]).await;

    let engine = CrawlEngine::new(create_test_config(&mock_server.uri())).unwrap();
    let mut handle = engine
        .start(CrawlRequest::new("politics", 2, 3), MemorySink::default())
        .unwrap();

    let events = handle.collect_events().await;
    let progress: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Progress { done, total } => Some((*done, *total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(0, Some(2)), (1, Some(2))]);

    let statuses: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Status(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    assert!(statuses.contains(&"Processing page 2..."));
    assert!(statuses.contains(&"Processing page 3..."));
}
