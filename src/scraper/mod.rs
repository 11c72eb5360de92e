//! Scraping backends and the capability they share.
//!
//! A backend only has to say how to turn a URL into content; [`Scraper::scrape`]
//! times the attempt and folds every failure into a [`ScraperResult`], so
//! nothing raised by a backend reaches the runner through the normal path.

use crate::result::{ErrorKind, ScraperResult};
use async_trait::async_trait;
use std::time::Instant;
use thiserror::Error;

pub mod browser;
pub mod crawl4ai;
pub mod firecrawl;

pub use browser::BrowserScraper;
pub use crawl4ai::Crawl4AiScraper;
pub use firecrawl::FirecrawlScraper;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Crawl failed: {0}")]
    CrawlFailed(String),

    #[error("Empty content returned")]
    EmptyContent,

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Missing API key")]
    MissingCredential,

    #[error("Invalid API key")]
    InvalidCredential,

    #[error("API quota exceeded")]
    QuotaExceeded,

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Unknown(String),
}

impl ScrapeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrapeError::Timeout(_) => ErrorKind::Timeout,
            ScrapeError::Navigation(_) => ErrorKind::Navigation,
            ScrapeError::CrawlFailed(_) => ErrorKind::CrawlFailed,
            ScrapeError::EmptyContent => ErrorKind::EmptyContent,
            ScrapeError::DependencyUnavailable(_) => ErrorKind::DependencyUnavailable,
            ScrapeError::MissingCredential => ErrorKind::MissingCredential,
            ScrapeError::InvalidCredential => ErrorKind::InvalidCredential,
            ScrapeError::QuotaExceeded => ErrorKind::QuotaExceeded,
            ScrapeError::Api { .. } => ErrorKind::Api,
            ScrapeError::Network(_) => ErrorKind::Network,
            ScrapeError::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

/// One scraping technology measured by the benchmark.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Name reported as `tool_name` in results.
    fn name(&self) -> &str;

    /// Fetch the textual content of `url`. Content that is empty must be
    /// reported as [`ScrapeError::EmptyContent`]; whether whitespace counts as
    /// content is up to the backend.
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;

    /// Time one fetch and normalize its outcome. Never fails.
    async fn scrape(&self, url: &str) -> ScraperResult {
        let start = Instant::now();
        let fetched = self.fetch(url).await;
        let elapsed = start.elapsed();

        match fetched {
            Ok(content) if content.is_empty() => {
                log::warn!("{} returned no content for {}", self.name(), url);
                let err = ScrapeError::EmptyContent;
                ScraperResult::failure(self.name(), elapsed, err.kind(), err.to_string())
            }
            Ok(content) => {
                log::info!(
                    "{} fetched {} characters in {:.3}s",
                    self.name(),
                    content.chars().count(),
                    elapsed.as_secs_f64()
                );
                ScraperResult::success(self.name(), elapsed, &content)
            }
            Err(err) => {
                log::error!("{} failed on {}: {}", self.name(), url, err);
                ScraperResult::failure(self.name(), elapsed, err.kind(), err.to_string())
            }
        }
    }
}
