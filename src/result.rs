use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

/// Number of leading characters of extracted content kept in a snippet.
pub const SNIPPET_CHARS: usize = 200;

/// Prefix of the snippet shown for a failed backend.
pub const ERROR_PREFIX: &str = "ERROR: ";

/// Coarse classification of why a backend failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Navigation,
    CrawlFailed,
    EmptyContent,
    DependencyUnavailable,
    MissingCredential,
    InvalidCredential,
    QuotaExceeded,
    Api,
    Network,
    Unknown,
}

/// What a single backend produced.
///
/// Success and failure are separate variants, so a result can never carry an
/// error message alongside a non-zero content length.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        content_length: usize,
        content_snippet: String,
    },
    Failure {
        kind: ErrorKind,
        message: String,
    },
}

/// The normalized record produced by every backend for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ResultRecord", from = "ResultRecord")]
pub struct ScraperResult {
    tool_name: String,
    time_taken: f64,
    outcome: Outcome,
}

impl ScraperResult {
    pub fn success(tool_name: impl Into<String>, elapsed: Duration, content: &str) -> Self {
        let content_snippet = content
            .chars()
            .take(SNIPPET_CHARS)
            .collect::<String>()
            .trim()
            .to_string();

        Self {
            tool_name: tool_name.into(),
            time_taken: round_secs(elapsed),
            outcome: Outcome::Success {
                content_length: content.chars().count(),
                content_snippet,
            },
        }
    }

    pub fn failure(
        tool_name: impl Into<String>,
        elapsed: Duration,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            time_taken: round_secs(elapsed),
            outcome: Outcome::Failure {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Wall-clock seconds, rounded to milliseconds.
    pub fn time_taken(&self) -> f64 {
        self.time_taken
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn content_length(&self) -> usize {
        match &self.outcome {
            Outcome::Success { content_length, .. } => *content_length,
            Outcome::Failure { .. } => 0,
        }
    }

    pub fn content_snippet(&self) -> Cow<'_, str> {
        match &self.outcome {
            Outcome::Success {
                content_snippet, ..
            } => Cow::Borrowed(content_snippet),
            Outcome::Failure { message, .. } => Cow::Owned(format!("{ERROR_PREFIX}{message}")),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success { .. } => None,
            Outcome::Failure { message, .. } => Some(message),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            Outcome::Success { .. } => None,
            Outcome::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Flat wire shape of a [`ScraperResult`], used for JSON/CSV output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub tool_name: String,
    pub time_taken: f64,
    pub content_length: usize,
    pub content_snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl From<ScraperResult> for ResultRecord {
    fn from(result: ScraperResult) -> Self {
        let content_length = result.content_length();
        let content_snippet = result.content_snippet().into_owned();
        let error_kind = result.error_kind();
        let error = result.error().map(str::to_string);

        Self {
            tool_name: result.tool_name,
            time_taken: result.time_taken,
            content_length,
            content_snippet,
            error,
            error_kind,
        }
    }
}

impl From<ResultRecord> for ScraperResult {
    fn from(record: ResultRecord) -> Self {
        let outcome = match record.error {
            Some(message) => Outcome::Failure {
                kind: record.error_kind.unwrap_or(ErrorKind::Unknown),
                message,
            },
            None => Outcome::Success {
                content_length: record.content_length,
                content_snippet: record.content_snippet,
            },
        };

        Self {
            tool_name: record.tool_name,
            time_taken: record.time_taken.max(0.0),
            outcome,
        }
    }
}

fn round_secs(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}
