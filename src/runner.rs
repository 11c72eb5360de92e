//! Fan-out/fan-in over the configured backends.
//!
//! Every backend's `scrape` future is polled concurrently inside the caller's
//! task and the runner waits for all of them; one backend failing never
//! cancels another. Results come back in configuration order.

use crate::config::BenchConfig;
use crate::metrics::collector::MetricsCollector;
use crate::metrics::snapshot::MetricsSnapshot;
use crate::result::{ErrorKind, ScraperResult};
use crate::scraper::{BrowserScraper, Crawl4AiScraper, FirecrawlScraper, Scraper};
use crate::summary::Summary;
use futures::future::{join_all, FutureExt};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Everything one benchmark pass produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub url: String,
    /// RFC 3339 timestamp taken when the backends were launched.
    pub started_at: String,
    pub results: Vec<ScraperResult>,
    pub summary: Option<Summary>,
}

pub struct BenchmarkRunner {
    scrapers: Vec<Arc<dyn Scraper>>,
    metrics: Arc<MetricsCollector>,
}

impl BenchmarkRunner {
    pub fn new(scrapers: Vec<Arc<dyn Scraper>>, metrics: Option<Arc<MetricsCollector>>) -> Self {
        Self {
            scrapers,
            metrics: metrics.unwrap_or_else(|| Arc::new(MetricsCollector::new())),
        }
    }

    /// Builds the enabled backends in their fixed order: browser, Crawl4AI,
    /// Firecrawl. The Firecrawl credential is taken from `config` as is.
    pub fn from_config(config: &BenchConfig) -> Self {
        let mut scrapers: Vec<Arc<dyn Scraper>> = Vec::new();
        if config.browser.enabled {
            scrapers.push(Arc::new(BrowserScraper::new(config.browser.clone())));
        }
        if config.crawl4ai.enabled {
            scrapers.push(Arc::new(Crawl4AiScraper::new(config.crawl4ai.clone())));
        }
        if config.firecrawl.enabled {
            scrapers.push(Arc::new(FirecrawlScraper::new(config.firecrawl.clone())));
        }
        Self::new(scrapers, None)
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.scrapers.iter().map(|s| s.name().to_string()).collect()
    }

    /// Scrape `url` with every backend and return one result per backend.
    pub async fn run(&self, url: &str) -> Vec<ScraperResult> {
        log::info!("Benchmarking {} backends against {}", self.scrapers.len(), url);

        let tasks = self.scrapers.iter().map(|scraper| {
            let metrics = self.metrics.clone();
            async move {
                metrics.backend_started();
                let start = Instant::now();

                let result = match AssertUnwindSafe(scraper.scrape(url)).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        log::error!("{} panicked: {}", scraper.name(), message);
                        ScraperResult::failure(scraper.name(), Duration::ZERO, ErrorKind::Unknown, message)
                    }
                };

                if result.is_success() {
                    metrics.record_success(start.elapsed());
                } else {
                    metrics.record_failure(start.elapsed());
                }
                result
            }
        });

        let results = join_all(tasks).await;
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        log::info!(
            "Benchmark finished: {}/{} backends succeeded",
            succeeded,
            results.len()
        );
        results
    }

    /// [`run`](Self::run) plus the summary and run metadata.
    pub async fn run_report(&self, url: &str) -> BenchmarkReport {
        let started_at = chrono::Utc::now().to_rfc3339();
        let results = self.run(url).await;
        let summary = Summary::from_results(&results);

        BenchmarkReport {
            url: url.to_string(),
            started_at,
            results,
            summary,
        }
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn watch_metrics(&self) -> watch::Receiver<MetricsSnapshot> {
        let (tx, rx) = watch::channel(self.metrics.snapshot());
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(250));
            loop {
                interval.tick().await;
                if tx.send(metrics.snapshot()).is_err() {
                    break;
                }
            }
        });
        rx
    }
}

/// One-call entry point: build the configured backends and run them once.
pub async fn run_benchmark(url: &str, config: &BenchConfig) -> BenchmarkReport {
    BenchmarkRunner::from_config(config).run_report(url).await
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("backend panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("backend panicked: {message}")
    } else {
        "backend panicked".to_string()
    }
}
