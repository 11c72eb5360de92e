use super::Reporter;
use crate::error::{Error, Result};
use crate::runner::BenchmarkReport;
use async_trait::async_trait;
use indicatif::MultiProgress;
use std::sync::Arc;

const RULE_WIDTH: usize = 70;
const SNIPPET_DISPLAY_CHARS: usize = 100;

pub struct ConsoleReporter {
    multi: Option<Arc<MultiProgress>>,
}

impl ConsoleReporter {
    pub fn new(multi: Option<Arc<MultiProgress>>) -> Self {
        Self { multi }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Reporter for ConsoleReporter {
    async fn write(&mut self, report: &BenchmarkReport) -> Result<()> {
        let output = render(report);

        if let Some(multi) = &self.multi {
            for line in output.lines() {
                multi.println(line).map_err(|e| Error::Internal(e.to_string()))?;
            }
        } else {
            for line in output.lines() {
                println!("{}", line);
            }
        }
        Ok(())
    }
}

/// Human-readable rendering of a report.
pub fn render(report: &BenchmarkReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        " BENCHMARK RESULTS".to_string(),
        rule.clone(),
        format!("Target URL: {}", report.url),
        String::new(),
    ];

    for result in &report.results {
        lines.push(format!("Tool: {}", result.tool_name()));
        lines.push(format!("   Time Taken: {}s", result.time_taken()));
        lines.push(format!(
            "   Content Length: {} characters",
            result.content_length()
        ));
        lines.push(match result.error() {
            Some(error) => format!("   Error: {}", error),
            None => "   Success".to_string(),
        });
        lines.push(format!("   Snippet: {}", shorten(&result.content_snippet())));
        lines.push(String::new());
    }

    match &report.summary {
        Some(summary) => {
            lines.push(format!(
                " Fastest: {} ({}s)",
                summary.fastest.tool_name, summary.fastest.time_taken
            ));
            lines.push(format!(
                " Most Content: {} ({} chars)",
                summary.most_content.tool_name, summary.most_content.content_length
            ));
        }
        None => lines.push(" No backend succeeded".to_string()),
    }
    lines.push(rule);

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn shorten(snippet: &str) -> String {
    if snippet.chars().count() > SNIPPET_DISPLAY_CHARS {
        let head: String = snippet.chars().take(SNIPPET_DISPLAY_CHARS).collect();
        format!("{head}...")
    } else {
        snippet.to_string()
    }
}
