//! Integration tests for scraping
//!
//! These tests run both scrapers against wiremock servers and check the
//! resulting sessions end-to-end.

use std::sync::Arc;
use std::time::Duration;
use trawler::config::{load_config, ScraperConfig};
use trawler::output::{format_markdown_report, MetricsObserver, SessionSummary};
use trawler::{AsyncScraper, ErrorKind, Fields, ScrapeObserver, Scraper, SessionState};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn test_config() -> ScraperConfig {
    ScraperConfig::default()
        .with_delay(Duration::ZERO)
        .with_max_retries(2)
        .with_backoff(Duration::from_millis(5), Duration::from_millis(20))
        .with_timeout(Duration::from_secs(5))
        .with_user_agent("trawler-test/1.0")
}

fn page(title: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            r#"<html><head><title>{}</title>
            <meta name="description" content="About {}"></head>
            <body><h1>{}</h1><a href="/next">next</a><p>Some words here</p></body></html>"#,
            title, title, title
        ))
        .insert_header("content-type", "text/html")
}

/// Mounts three pages where `/two` always fails with 500
async fn three_page_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(page("One"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/three"))
        .respond_with(page("Three"))
        .mount(&server)
        .await;
    server
}

fn urls(server: &MockServer) -> Vec<String> {
    ["one", "two", "three"]
        .iter()
        .map(|p| format!("{}/{}", server.uri(), p))
        .collect()
}

#[tokio::test]
async fn test_batch_isolates_server_failure() {
    init_tracing();
    let server = three_page_server().await;
    let urls = urls(&server);
    let scraper = Scraper::new(test_config()).expect("valid config");

    let session = scraper.scrape_multiple_urls(&urls).await;

    assert_eq!(session.urls_total, 3);
    assert_eq!(session.urls_succeeded, 2);
    assert_eq!(session.urls_failed, 1);
    assert_eq!(session.state, SessionState::PartiallyFailed);

    let sources: Vec<_> = session.records.iter().map(|r| r.source_url.clone()).collect();
    assert_eq!(sources, vec![urls[0].clone(), urls[2].clone()]);
    assert_eq!(session.records[0].get("title"), Some(&serde_json::json!("One")));
    assert_eq!(
        session.records[1].get("meta_description"),
        Some(&serde_json::json!("About Three"))
    );
    assert_eq!(
        session.records[0].get("links"),
        Some(&serde_json::json!([
            {"url": format!("{}/next", server.uri()), "text": "next", "title": ""}
        ]))
    );

    assert_eq!(session.errors.len(), 1);
    assert_eq!(session.errors[0].0, urls[1]);
    match &session.errors[0].1 {
        ErrorKind::RetryExhausted { attempts, last } => {
            assert_eq!(*attempts, 3);
            assert_eq!(**last, ErrorKind::ServerOrThrottle { status: 500 });
        }
        other => panic!("unexpected error kind: {:?}", other),
    }
}

#[tokio::test]
async fn test_async_batch_matches_sequential() {
    init_tracing();
    let server = three_page_server().await;
    let urls = urls(&server);
    let scraper =
        AsyncScraper::new(test_config().with_max_concurrent(3)).expect("valid config");

    let session = scraper.scrape_multiple_async(&urls).await;

    assert_eq!(session.urls_succeeded, 2);
    assert_eq!(session.urls_failed, 1);
    let sources: Vec<_> = session.records.iter().map(|r| r.source_url.clone()).collect();
    assert_eq!(sources, vec![urls[0].clone(), urls[2].clone()]);
    assert_eq!(session.errors[0].0, urls[1]);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = Scraper::new(test_config()).expect("valid config");
    let error = scraper
        .scrape_url(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(error, ErrorKind::Client { status: 404 });
}

#[tokio::test]
async fn test_throttled_then_recovered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(page("Busy"))
        .mount(&server)
        .await;

    let scraper = Scraper::new(test_config()).expect("valid config");
    let record = scraper
        .scrape_url(&format!("{}/busy", server.uri()))
        .await
        .expect("second attempt succeeds");

    assert_eq!(record.get("title"), Some(&serde_json::json!("Busy")));
    let stats = scraper.stats();
    assert_eq!(stats.requests_made, 2);
    assert_eq!(stats.retries, 1);
}

#[tokio::test]
async fn test_unresolvable_host_reports_kind() {
    let scraper = Scraper::new(test_config().with_max_retries(0)).expect("valid config");
    let session = scraper
        .scrape_multiple_urls(&["not a url", "http://host.invalid/"])
        .await;

    assert_eq!(session.urls_failed, 2);
    assert!(matches!(session.errors[0].1, ErrorKind::Resolution { .. }));
    assert_eq!(session.state, SessionState::PartiallyFailed);
}

#[tokio::test]
async fn test_custom_extractor_failure_isolated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page("Product"))
        .mount(&server)
        .await;
    let urls = vec![
        format!("{}/broken", server.uri()),
        format!("{}/item", server.uri()),
    ];

    let mut scraper = Scraper::new(test_config()).expect("valid config");
    scraper.set_custom_extractor(|page| {
        if page.url.ends_with("/broken") {
            anyhow::bail!("no price on page");
        }
        let mut fields = Fields::new();
        fields.insert("price".to_string(), serde_json::json!(9.99));
        Ok(fields)
    });

    let session = scraper.scrape_multiple_urls(&urls).await;

    assert_eq!(session.urls_succeeded, 1);
    assert_eq!(session.records[0].source_url, urls[1]);
    assert_eq!(session.records[0].get("price"), Some(&serde_json::json!(9.99)));
    assert_eq!(session.errors[0].0, urls[0]);
    assert!(matches!(session.errors[0].1, ErrorKind::Extraction { .. }));
}

#[tokio::test]
async fn test_configured_headers_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "trawler-test/1.0"))
        .and(header("x-api-key", "secret"))
        .respond_with(page("Headers"))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = Scraper::new(test_config().with_header("X-Api-Key", "secret"))
        .expect("valid config");
    let record = scraper.scrape_url(&server.uri()).await.expect("headers matched");

    assert_eq!(record.get("title"), Some(&serde_json::json!("Headers")));
}

#[tokio::test]
async fn test_delay_spaces_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page("Slow"))
        .mount(&server)
        .await;
    let urls: Vec<_> = (0..3).map(|i| format!("{}/{}", server.uri(), i)).collect();

    let scraper = Scraper::new(test_config().with_delay(Duration::from_millis(100)))
        .expect("valid config");
    let started = std::time::Instant::now();
    scraper.scrape_multiple_urls(&urls).await;

    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_metrics_and_report() {
    let server = three_page_server().await;
    let urls = urls(&server);
    let metrics = Arc::new(MetricsObserver::new());

    let scraper = Scraper::new(test_config())
        .expect("valid config")
        .with_observer(metrics.clone() as Arc<dyn ScrapeObserver>);
    let session = scraper.scrape_multiple_urls(&urls).await;

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.total_urls, 3);
    assert_eq!(snapshot.successful_requests, 2);
    assert_eq!(snapshot.failed_requests, 1);
    assert_eq!(snapshot.status_codes.get(&200), Some(&2));
    assert_eq!(snapshot.status_codes.get(&500), Some(&1));
    assert_eq!(snapshot.errors_by_type.get("retry_exhausted"), Some(&1));
    assert!(snapshot.finished_at.is_some());

    let summary = SessionSummary::from_session(&session);
    let report = format_markdown_report(&summary, Some(&snapshot));
    assert!(report.contains("- **Failed**: 1"));
    assert!(report.contains("| retry_exhausted | 1 |"));
}

#[tokio::test]
async fn test_scraper_from_config_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page("Configured"))
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("trawler.toml");
    std::fs::write(
        &path,
        r#"
[requests]
delay-ms = 0
max-retries = 1
max-concurrent = 2

[http]
user-agent = "configured/2.0"

[storage]
default-format = "csv"
"#,
    )
    .unwrap();

    let config = load_config(&path).expect("config parses");
    let scraper = AsyncScraper::new(config).expect("valid config");
    let session = scraper.scrape_multiple_async(&[server.uri()]).await;
    assert_eq!(session.state, SessionState::Completed);

    let output = dir.path().join("out.csv");
    let report = scraper
        .save_records(&session.records, &output)
        .expect("save succeeds");
    assert_eq!(report.records_written, 1);
    assert!(std::fs::read_to_string(&output)
        .unwrap()
        .starts_with("source_url,fetched_at,"));
}
