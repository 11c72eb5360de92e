//! Crawl4AI backend.
//!
//! Crawl4AI only ships as a Python package, so the crawl runs in a child
//! interpreter executing [`BRIDGE_PROGRAM`]. The program performs a single
//! `arun` and prints one marked JSON line describing the SDK's result.

use super::{ScrapeError, Scraper};
use crate::config::Crawl4AiSettings;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind as IoErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub const TOOL_NAME: &str = "Crawl4AI";

const REPORT_MARKER: &str = "__SCRAPE_BENCH_REPORT__";

/// Exit status used by the bridge when `crawl4ai` cannot be imported.
const MISSING_SDK_STATUS: i32 = 3;

const BRIDGE_PROGRAM: &str = r#"
import asyncio, json, logging, sys

MARKER = "__SCRAPE_BENCH_REPORT__"

def emit(report):
    sys.stdout.write(MARKER + json.dumps(report) + "\n")
    sys.stdout.flush()

try:
    from crawl4ai import AsyncWebCrawler
except ImportError as exc:
    emit({"success": False, "import_error": str(exc)})
    sys.exit(3)

logging.getLogger("crawl4ai").setLevel(logging.ERROR)

async def crawl(url):
    async with AsyncWebCrawler(verbose=False, headless=True) as crawler:
        result = await crawler.arun(url=url)
    markdown = getattr(result, "markdown", None)
    extracted = getattr(result, "extracted_content", None)
    return {
        "success": bool(getattr(result, "success", False)),
        "markdown": str(markdown) if markdown else None,
        "extracted_content": str(extracted) if extracted else None,
        "error_message": getattr(result, "error_message", None),
    }

try:
    emit(asyncio.run(crawl(sys.argv[1])))
except Exception as exc:
    emit({"success": False, "error_message": "%s: %s" % (type(exc).__name__, exc)})
"#;

/// What the bridge program reports about one `arun` call.
#[derive(Debug, Default, Deserialize)]
struct CrawlReport {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    extracted_content: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    import_error: Option<String>,
}

pub struct Crawl4AiScraper {
    settings: Crawl4AiSettings,
}

impl Crawl4AiScraper {
    pub fn new(settings: Crawl4AiSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Scraper for Crawl4AiScraper {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let limit = Duration::from_millis(self.settings.timeout_ms);
        log::debug!("Running Crawl4AI via `{}` for {}", self.settings.python, url);

        let mut command = Command::new(&self.settings.python);
        command
            .arg("-c")
            .arg(BRIDGE_PROGRAM)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group, so the browsers Crawl4AI starts can be killed with it.
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| match e.kind() {
                IoErrorKind::NotFound | IoErrorKind::PermissionDenied => {
                    ScrapeError::DependencyUnavailable(format!(
                        "Python interpreter `{}` not available: {}",
                        self.settings.python, e
                    ))
                }
                _ => ScrapeError::Unknown(format!("failed to start Crawl4AI: {e}")),
            })?;

        let pid = child.id();
        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| {
                ScrapeError::Unknown(format!("failed to collect Crawl4AI output: {e}"))
            })?,
            Err(_) => {
                // The interpreter itself goes down with the dropped child.
                if let Some(pid) = pid {
                    kill_process_group(pid).await;
                }
                return Err(ScrapeError::Timeout(format!(
                    "Crawl4AI exceeded {}ms",
                    limit.as_millis()
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            log::debug!("Crawl4AI stderr: {}", stderr.trim());
        }

        interpret_output(&stdout, &stderr, output.status.code())
    }
}

#[cfg(unix)]
async fn kill_process_group(pgid: u32) {
    let killed = Command::new("kill")
        .arg("-KILL")
        .arg("--")
        .arg(format!("-{pgid}"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match killed {
        Ok(status) if status.success() => log::debug!("Killed Crawl4AI process group {}", pgid),
        Ok(status) => log::warn!("kill for Crawl4AI process group {} exited with {}", pgid, status),
        Err(e) => log::warn!("Failed to kill Crawl4AI process group {}: {}", pgid, e),
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pgid: u32) {}

/// Map the bridge program's output onto content or a scrape error.
fn interpret_output(
    stdout: &str,
    stderr: &str,
    exit_code: Option<i32>,
) -> Result<String, ScrapeError> {
    let report_line = stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(REPORT_MARKER));

    let report: CrawlReport = match report_line {
        Some(line) => serde_json::from_str(line)
            .map_err(|e| ScrapeError::Unknown(format!("malformed Crawl4AI report: {e}")))?,
        None => {
            let detail = stderr.lines().last().unwrap_or("no output").trim().to_string();
            return Err(ScrapeError::Unknown(format!(
                "Crawl4AI exited with status {} without a report: {}",
                exit_code.map_or_else(|| "unknown".to_string(), |c| c.to_string()),
                detail
            )));
        }
    };

    if report.import_error.is_some() || exit_code == Some(MISSING_SDK_STATUS) {
        return Err(ScrapeError::DependencyUnavailable(format!(
            "Crawl4AI not installed ({}). Run: pip install crawl4ai",
            report.import_error.as_deref().unwrap_or("module not found")
        )));
    }

    if !report.success {
        return Err(ScrapeError::CrawlFailed(
            report
                .error_message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Unknown error".to_string()),
        ));
    }

    [report.markdown, report.extracted_content]
        .into_iter()
        .flatten()
        .find(|content| !content.is_empty())
        .ok_or(ScrapeError::EmptyContent)
}
