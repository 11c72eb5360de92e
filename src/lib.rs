pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod result;
pub mod runner;
pub mod scraper;
pub mod summary;

pub use error::{Error, Result};
pub use metrics::collector::MetricsCollector;
pub use metrics::snapshot::MetricsSnapshot;
pub use result::{ErrorKind, Outcome, ScraperResult};
pub use runner::{run_benchmark, BenchmarkReport, BenchmarkRunner};
pub use scraper::{ScrapeError, Scraper};
pub use summary::Summary;
