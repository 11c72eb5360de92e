//! Headless Chromium backend.
//!
//! Each call launches its own browser with a private profile directory,
//! renders the page and reads `document.body.innerText`. The browser is shut
//! down before `fetch` returns, whatever the outcome.

use super::{ScrapeError, Scraper};
use crate::config::BrowserSettings;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

pub const TOOL_NAME: &str = "Chromium";

/// No new resource entries for this long counts as network idle.
const IDLE_WINDOW: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Limit for each shutdown step before the process is killed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct BrowserScraper {
    settings: BrowserSettings,
}

struct LaunchedBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl BrowserScraper {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    async fn launch(&self, profile_dir: PathBuf) -> Result<LaunchedBrowser, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(&profile_dir)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");

        if let Some(path) = &self.settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        // Fails when no Chromium binary can be auto-detected.
        let config = builder.build().map_err(ScrapeError::DependencyUnavailable)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            ScrapeError::DependencyUnavailable(format!("failed to launch Chromium: {e}"))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::trace!("Chromium handler event error: {}", e);
                }
            }
        });

        Ok(LaunchedBrowser {
            browser,
            handler,
            profile_dir,
        })
    }

    async fn extract(&self, browser: &Browser, url: &str) -> Result<String, ScrapeError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Navigation(format!("failed to open page: {e}")))?;

        let nav_limit = Duration::from_millis(self.settings.navigation_timeout_ms);
        log::debug!("Navigating to {} (limit {}ms)", url, nav_limit.as_millis());
        match timeout(nav_limit, navigate(&page, url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(ScrapeError::Timeout(format!(
                    "navigation to {} exceeded {}ms",
                    url,
                    nav_limit.as_millis()
                )))
            }
        }

        let selector_limit = Duration::from_millis(self.settings.selector_timeout_ms);
        if let Err(e) = wait_for_selector(&page, &self.settings.content_selector, selector_limit).await
        {
            log::debug!("{}; falling back to `{}`", e, self.settings.fallback_selector);
            wait_for_selector(&page, &self.settings.fallback_selector, selector_limit).await?;
        }

        let text: Option<String> = page
            .evaluate("document.body ? document.body.innerText : null")
            .await
            .map_err(|e| ScrapeError::Navigation(format!("failed to read page text: {e}")))?
            .into_value()
            .map_err(|e| ScrapeError::Unknown(format!("unexpected page text value: {e}")))?;

        visible_text(text.unwrap_or_default())
    }
}

/// Rendered text made only of whitespace counts as an empty page.
fn visible_text(text: String) -> Result<String, ScrapeError> {
    if text.trim().is_empty() {
        Err(ScrapeError::EmptyContent)
    } else {
        Ok(text)
    }
}

#[async_trait]
impl Scraper for BrowserScraper {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let profile_dir = unique_profile_dir();
        let launched = match self.launch(profile_dir.clone()).await {
            Ok(launched) => launched,
            Err(e) => {
                let _ = tokio::fs::remove_dir_all(&profile_dir).await;
                return Err(e);
            }
        };

        let LaunchedBrowser {
            mut browser,
            handler,
            profile_dir,
        } = launched;

        let extracted = self.extract(&browser, url).await;

        shutdown(&mut browser).await;
        handler.abort();
        let _ = tokio::fs::remove_dir_all(&profile_dir).await;

        extracted
    }
}

/// Close the browser and reap its process, killing it when either step fails
/// or overruns [`SHUTDOWN_GRACE`].
async fn shutdown(browser: &mut Browser) {
    let mut exited = finished_within(SHUTDOWN_GRACE, "close Chromium", browser.close()).await;
    if exited {
        exited =
            finished_within(SHUTDOWN_GRACE, "wait for Chromium to exit", browser.wait()).await;
    }

    if !exited {
        match browser.kill().await {
            Some(Err(e)) => log::warn!("Failed to kill Chromium: {}", e),
            _ => log::debug!("Killed Chromium"),
        }
    }
}

async fn finished_within<T, E: Display>(
    limit: Duration,
    step: &str,
    fut: impl Future<Output = Result<T, E>>,
) -> bool {
    match timeout(limit, fut).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            log::warn!("Failed to {}: {}", step, e);
            false
        }
        Err(_) => {
            log::warn!("Timed out after {}ms trying to {}", limit.as_millis(), step);
            false
        }
    }
}

/// Load `url` and wait until the page stops requesting resources.
async fn navigate(page: &Page, url: &str) -> Result<(), ScrapeError> {
    page.goto(url)
        .await
        .map_err(|e| ScrapeError::Navigation(e.to_string()))?;
    page.wait_for_navigation()
        .await
        .map_err(|e| ScrapeError::Navigation(e.to_string()))?;

    let mut last_count: Option<u64> = None;
    let mut quiet_since = Instant::now();
    loop {
        let count: u64 = page
            .evaluate("performance.getEntriesByType('resource').length")
            .await
            .map_err(|e| ScrapeError::Navigation(e.to_string()))?
            .into_value()
            .unwrap_or(0);

        if last_count != Some(count) {
            last_count = Some(count);
            quiet_since = Instant::now();
        } else if quiet_since.elapsed() >= IDLE_WINDOW {
            return Ok(());
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn wait_for_selector(page: &Page, selector: &str, limit: Duration) -> Result<(), ScrapeError> {
    timeout(limit, async {
        while page.find_element(selector).await.is_err() {
            sleep(POLL_INTERVAL).await;
        }
    })
    .await
    .map_err(|_| {
        ScrapeError::Timeout(format!(
            "waiting for `{}` exceeded {}ms",
            selector,
            limit.as_millis()
        ))
    })
}

fn unique_profile_dir() -> PathBuf {
    static LAUNCH_ID: AtomicU64 = AtomicU64::new(0);

    let launch_id = LAUNCH_ID.fetch_add(1, Ordering::SeqCst);
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    std::env::temp_dir().join(format!(
        "scrape-bench-chromium-{}-{}-{}",
        std::process::id(),
        launch_id,
        nanos
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ErrorKind;

    #[test]
    fn test_whitespace_page_is_empty_content() {
        let err = visible_text(" \n\t ".to_string()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyContent);
        assert_eq!(visible_text(" text ".to_string()).unwrap(), " text ");
    }

    #[tokio::test]
    async fn test_hung_shutdown_step_gives_up_at_the_limit() {
        let start = Instant::now();
        let finished = finished_within(
            Duration::from_millis(100),
            "close",
            futures::future::pending::<Result<(), String>>(),
        )
        .await;

        assert!(!finished);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_failed_shutdown_step_is_not_finished() {
        let failed = finished_within(Duration::from_secs(1), "close", async {
            Err::<(), _>("CDP request timed out")
        })
        .await;
        let done = finished_within(Duration::from_secs(1), "close", async {
            Ok::<_, String>(())
        })
        .await;

        assert!(!failed);
        assert!(done);
    }

    #[test]
    fn test_profile_dirs_are_unique() {
        assert_ne!(unique_profile_dir(), unique_profile_dir());
    }

    #[tokio::test]
    async fn test_missing_chromium_is_a_dependency_failure() {
        let scraper = BrowserScraper::new(BrowserSettings {
            chrome_executable: Some(PathBuf::from("/nonexistent/scrape-bench/chrome")),
            ..BrowserSettings::default()
        });

        let result = scraper.scrape("https://example.com").await;

        assert_eq!(result.tool_name(), TOOL_NAME);
        assert_eq!(result.error_kind(), Some(ErrorKind::DependencyUnavailable));
        assert_eq!(result.content_length(), 0);
        assert!(result.content_snippet().starts_with("ERROR: Dependency unavailable"));
        assert!(result.time_taken() >= 0.0);
    }
}
