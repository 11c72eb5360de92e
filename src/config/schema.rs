use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BenchConfig {
    #[serde(default = "default_name")]
    #[validate(length(min = 1))]
    pub name: String,

    /// Target page; the command line may supply or override it.
    #[serde(default)]
    #[validate(url)]
    pub url: Option<String>,

    #[serde(default)]
    #[validate]
    pub browser: BrowserSettings,

    #[serde(default)]
    #[validate]
    pub crawl4ai: Crawl4AiSettings,

    #[serde(default)]
    #[validate]
    pub firecrawl: FirecrawlSettings,

    #[serde(default)]
    pub outputs: Vec<OutputConfig>,

    /// Optional path to a parent configuration file to inherit from
    #[serde(default)]
    pub extends: Option<String>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            url: None,
            browser: BrowserSettings::default(),
            crawl4ai: Crawl4AiSettings::default(),
            firecrawl: FirecrawlSettings::default(),
            outputs: Vec::new(),
            extends: None,
        }
    }
}

impl BenchConfig {
    pub fn enabled_backends(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.browser.enabled {
            names.push(crate::scraper::browser::TOOL_NAME);
        }
        if self.crawl4ai.enabled {
            names.push(crate::scraper::crawl4ai::TOOL_NAME);
        }
        if self.firecrawl.enabled {
            names.push(crate::scraper::firecrawl::TOOL_NAME);
        }
        names
    }

    /// The page to benchmark, which must be an absolute `http(s)` URL.
    pub fn target_url(&self) -> Result<Url> {
        let raw = self.url.as_deref().ok_or_else(|| {
            Error::Config("no target URL: pass --url or set `url` in the config".to_string())
        })?;
        let url = Url::parse(raw).map_err(|e| Error::Config(format!("invalid URL `{raw}`: {e}")))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(Error::Config(format!(
                "unsupported URL scheme `{scheme}` in `{raw}`"
            ))),
        }
    }
}

/// Headless Chromium driven over CDP.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BrowserSettings {
    pub enabled: bool,

    /// Chromium binary; auto-detected when unset.
    pub chrome_executable: Option<PathBuf>,

    #[validate(range(min = 1))]
    pub navigation_timeout_ms: u64,

    #[validate(range(min = 1))]
    pub selector_timeout_ms: u64,

    #[validate(length(min = 1))]
    pub content_selector: String,

    #[validate(length(min = 1))]
    pub fallback_selector: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            chrome_executable: None,
            navigation_timeout_ms: 30_000,
            selector_timeout_ms: 5_000,
            content_selector: "main".to_string(),
            fallback_selector: "body".to_string(),
        }
    }
}

/// The Crawl4AI Python SDK, run through a child interpreter.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Crawl4AiSettings {
    pub enabled: bool,

    #[validate(length(min = 1))]
    pub python: String,

    #[validate(range(min = 1))]
    pub timeout_ms: u64,
}

impl Default for Crawl4AiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            python: "python3".to_string(),
            timeout_ms: 120_000,
        }
    }
}

/// The hosted Firecrawl scraping API.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FirecrawlSettings {
    pub enabled: bool,

    /// Explicit credential. Takes precedence over `api_key_env`.
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is unset.
    #[validate(length(min = 1))]
    pub api_key_env: String,

    #[validate(url)]
    pub endpoint: String,

    #[validate(range(min = 1))]
    pub timeout_ms: u64,

    pub only_main_content: bool,
}

impl Default for FirecrawlSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            api_key_env: "FIRECRAWL_API_KEY".to_string(),
            endpoint: "https://api.firecrawl.dev/v0/scrape".to_string(),
            timeout_ms: 60_000,
            only_main_content: true,
        }
    }
}

impl FirecrawlSettings {
    /// Fill `api_key` from the environment when it is not set explicitly.
    pub fn resolve_api_key_from_env(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var(&self.api_key_env)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    Console,
    Json { path: String },
    Csv { path: String },
}

fn default_name() -> String {
    "scrape-bench".to_string()
}
