use super::{ScrapeError, Scraper};
use crate::config::FirecrawlSettings;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

pub const TOOL_NAME: &str = "Firecrawl";

/// Client for the hosted Firecrawl scrape endpoint.
pub struct FirecrawlScraper {
    settings: FirecrawlSettings,
}

impl FirecrawlScraper {
    pub fn new(settings: FirecrawlSettings) -> Self {
        Self { settings }
    }

    fn client(&self) -> Result<Client, ScrapeError> {
        Client::builder()
            .timeout(Duration::from_millis(self.settings.timeout_ms))
            .user_agent(concat!("scrape-bench/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScrapeError::Unknown(format!("failed to build HTTP client: {e}")))
    }
}

#[async_trait]
impl Scraper for FirecrawlScraper {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ScrapeError::MissingCredential)?;

        let payload = json!({
            "url": url,
            "pageOptions": {
                "onlyMainContent": self.settings.only_main_content
            }
        });

        log::debug!("POST {} for {}", self.settings.endpoint, url);
        let res = self
            .client()?
            .post(&self.settings.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        let status = res.status();
        match status {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED => return Err(ScrapeError::InvalidCredential),
            StatusCode::PAYMENT_REQUIRED => return Err(ScrapeError::QuotaExceeded),
            _ => {
                let body = res.text().await.unwrap_or_default();
                return Err(ScrapeError::Api {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        let body = res
            .text()
            .await
            .map_err(|e| ScrapeError::Network(e.to_string()))?;
        let data: Value = serde_json::from_str(&body)
            .map_err(|e| ScrapeError::Unknown(format!("invalid JSON from Firecrawl: {e}")))?;

        extract_content(&data)?.ok_or(ScrapeError::EmptyContent)
    }
}

/// Reads `data.markdown`/`data.content` when the response is wrapped in
/// `data`, and the same fields at top level otherwise. The first non-empty
/// field wins.
fn extract_content(response: &Value) -> Result<Option<String>, ScrapeError> {
    let scope = match response.get("data") {
        Some(data) if data.is_object() => data,
        Some(other) => {
            return Err(ScrapeError::Unknown(format!(
                "unexpected Firecrawl response: `data` is {other}"
            )))
        }
        None => response,
    };

    Ok(["markdown", "content"]
        .iter()
        .filter_map(|field| scope.get(field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string))
}
