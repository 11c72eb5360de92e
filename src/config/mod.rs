pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{BenchConfig, BrowserSettings, Crawl4AiSettings, FirecrawlSettings, OutputConfig};
