//! Fan-out/fan-in behaviour of the benchmark runner.

use async_trait::async_trait;
use scrape_bench::config::{BenchConfig, BrowserSettings, Crawl4AiSettings, FirecrawlSettings};
use scrape_bench::scraper::{ScrapeError, Scraper};
use scrape_bench::{BenchmarkRunner, ErrorKind, MetricsCollector, Summary};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Backend whose latency and reply are fixed up front.
struct Scripted {
    name: &'static str,
    delay: Duration,
    reply: Result<&'static str, fn() -> ScrapeError>,
    finished: Option<Arc<Mutex<Vec<&'static str>>>>,
}

impl Scripted {
    fn ok(name: &'static str, delay_ms: u64, content: &'static str) -> Self {
        Self {
            name,
            delay: Duration::from_millis(delay_ms),
            reply: Ok(content),
            finished: None,
        }
    }

    fn err(name: &'static str, delay_ms: u64, error: fn() -> ScrapeError) -> Self {
        Self {
            name,
            delay: Duration::from_millis(delay_ms),
            reply: Err(error),
            finished: None,
        }
    }

    fn recording(mut self, log: &Arc<Mutex<Vec<&'static str>>>) -> Self {
        self.finished = Some(log.clone());
        self
    }
}

#[async_trait]
impl Scraper for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, _url: &str) -> Result<String, ScrapeError> {
        tokio::time::sleep(self.delay).await;
        if let Some(log) = &self.finished {
            log.lock().await.push(self.name);
        }
        match self.reply {
            Ok(content) => Ok(content.to_string()),
            Err(make_error) => Err(make_error()),
        }
    }
}

struct Panicking;

#[async_trait]
impl Scraper for Panicking {
    fn name(&self) -> &str {
        "Panicking"
    }

    async fn fetch(&self, _url: &str) -> Result<String, ScrapeError> {
        tokio::task::yield_now().await;
        panic!("driver crashed");
    }
}

#[tokio::test]
async fn test_results_follow_configuration_order() {
    let finished = Arc::new(Mutex::new(Vec::new()));
    let runner = BenchmarkRunner::new(
        vec![
            Arc::new(Scripted::ok("first", 150, "one").recording(&finished)),
            Arc::new(Scripted::ok("second", 10, "two").recording(&finished)),
            Arc::new(Scripted::ok("third", 80, "three").recording(&finished)),
        ],
        None,
    );

    let results = runner.run("https://example.com").await;

    assert_eq!(*finished.lock().await, vec!["second", "third", "first"]);
    let names: Vec<_> = results.iter().map(|r| r.tool_name()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_backends_run_concurrently() {
    let runner = BenchmarkRunner::new(
        vec![
            Arc::new(Scripted::ok("a", 300, "a")),
            Arc::new(Scripted::ok("b", 300, "b")),
            Arc::new(Scripted::ok("c", 300, "c")),
        ],
        None,
    );

    let start = std::time::Instant::now();
    let results = runner.run("https://example.com").await;

    assert_eq!(results.len(), 3);
    assert!(start.elapsed() < Duration::from_millis(850));
}

#[tokio::test]
async fn test_failure_does_not_cancel_siblings() {
    let runner = BenchmarkRunner::new(
        vec![
            Arc::new(Scripted::err("fails-fast", 1, || {
                ScrapeError::Timeout("navigation exceeded 1ms".to_string())
            })),
            Arc::new(Scripted::ok("slow", 100, "made it")),
        ],
        None,
    );

    let results = runner.run("https://example.com").await;

    assert_eq!(results[0].error_kind(), Some(ErrorKind::Timeout));
    assert!(results[1].is_success());
    assert_eq!(results[1].content_snippet(), "made it");
}

#[tokio::test]
async fn test_panicking_backend_becomes_unknown_failure() {
    let runner = BenchmarkRunner::new(
        vec![
            Arc::new(Scripted::ok("steady", 5, "fine")),
            Arc::new(Panicking),
            Arc::new(Scripted::ok("also-steady", 5, "fine too")),
        ],
        None,
    );

    let results = runner.run("https://example.com").await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[1].tool_name(), "Panicking");
    assert_eq!(results[1].error_kind(), Some(ErrorKind::Unknown));
    assert_eq!(results[1].error(), Some("backend panicked: driver crashed"));
    assert_eq!(results[1].time_taken(), 0.0);
    assert!(results[0].is_success());
    assert!(results[2].is_success());
}

#[tokio::test]
async fn test_error_iff_zero_length_and_rounded_times() {
    let runner = BenchmarkRunner::new(
        vec![
            Arc::new(Scripted::ok("ok", 7, "content here")),
            Arc::new(Scripted::ok("empty", 3, "")),
            Arc::new(Scripted::err("quota", 2, || ScrapeError::QuotaExceeded)),
            Arc::new(Panicking),
        ],
        None,
    );

    for result in runner.run("https://example.com").await {
        assert_eq!(result.error().is_some(), result.content_length() == 0);
        if result.error().is_some() {
            assert!(result.content_snippet().starts_with("ERROR: "));
        }
        assert!(result.time_taken() >= 0.0);
        let millis = result.time_taken() * 1000.0;
        assert!((millis - millis.round()).abs() < 1e-6, "{}", result.time_taken());
    }
}

#[tokio::test]
async fn test_summary_picks_fastest_and_largest() {
    let runner = BenchmarkRunner::new(
        vec![
            Arc::new(Scripted::ok("one-second", 1000, "short")),
            Arc::new(Scripted::ok("two-seconds", 2000, "the longest content of all")),
            Arc::new(Scripted::ok("half-second", 500, "mid length")),
        ],
        None,
    );

    let report = runner.run_report("https://example.com").await;
    let summary = report.summary.expect("three successes");

    assert_eq!(summary.fastest.tool_name, "half-second");
    assert_eq!(summary.most_content.tool_name, "two-seconds");
}

#[tokio::test]
async fn test_summary_absent_when_everything_fails() {
    let runner = BenchmarkRunner::new(
        vec![
            Arc::new(Scripted::err("a", 1, || ScrapeError::MissingCredential)),
            Arc::new(Panicking),
        ],
        None,
    );

    let report = runner.run_report("https://example.com").await;

    assert!(report.summary.is_none());
    assert_eq!(Summary::from_results(&report.results), None);
}

#[tokio::test]
async fn test_metrics_reflect_the_run() {
    let metrics = Arc::new(MetricsCollector::new());
    let runner = BenchmarkRunner::new(
        vec![
            Arc::new(Scripted::ok("ok", 1, "x")),
            Arc::new(Scripted::err("bad", 1, || ScrapeError::EmptyContent)),
            Arc::new(Panicking),
        ],
        Some(metrics.clone()),
    );

    runner.run("https://example.com").await;
    let snapshot = metrics.snapshot();

    assert_eq!(snapshot.backends_launched, 3);
    assert_eq!(snapshot.backends_completed, 3);
    assert_eq!(snapshot.backends_succeeded, 1);
    assert_eq!(snapshot.backends_failed, 2);
    assert_eq!(snapshot.active_backends, 0);
}

/// Every real backend pointed at a broken environment still yields one
/// failure record each.
#[tokio::test]
async fn test_real_backends_degrade_to_error_records() {
    let config = BenchConfig {
        browser: BrowserSettings {
            chrome_executable: Some(PathBuf::from("/nonexistent/scrape-bench/chrome")),
            ..BrowserSettings::default()
        },
        crawl4ai: Crawl4AiSettings {
            python: "scrape-bench-no-such-python".to_string(),
            ..Crawl4AiSettings::default()
        },
        firecrawl: FirecrawlSettings {
            api_key: None,
            ..FirecrawlSettings::default()
        },
        ..BenchConfig::default()
    };

    let runner = BenchmarkRunner::from_config(&config);
    let results = runner.run("https://example.com").await;

    let names: Vec<_> = results.iter().map(|r| r.tool_name()).collect();
    assert_eq!(names, vec!["Chromium", "Crawl4AI", "Firecrawl"]);
    assert_eq!(results[0].error_kind(), Some(ErrorKind::DependencyUnavailable));
    assert_eq!(results[1].error_kind(), Some(ErrorKind::DependencyUnavailable));
    assert_eq!(results[2].error_kind(), Some(ErrorKind::MissingCredential));
    assert!(results.iter().all(|r| r.content_length() == 0));
}
