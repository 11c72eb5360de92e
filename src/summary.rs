use crate::result::ScraperResult;
use serde::{Deserialize, Serialize};

/// A backend singled out by the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    pub tool_name: String,
    pub time_taken: f64,
    pub content_length: usize,
}

impl From<&ScraperResult> for Leader {
    fn from(result: &ScraperResult) -> Self {
        Self {
            tool_name: result.tool_name().to_string(),
            time_taken: result.time_taken(),
            content_length: result.content_length(),
        }
    }
}

/// Winners among the successful backends of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub fastest: Leader,
    pub most_content: Leader,
}

impl Summary {
    /// Returns `None` when no backend succeeded. Ties go to the backend that
    /// was configured first.
    pub fn from_results(results: &[ScraperResult]) -> Option<Self> {
        let mut successes = results.iter().filter(|r| r.is_success());
        let first = successes.next()?;

        let (fastest, most_content) = successes.fold((first, first), |(fast, large), r| {
            let fast = if r.time_taken() < fast.time_taken() { r } else { fast };
            let large = if r.content_length() > large.content_length() {
                r
            } else {
                large
            };
            (fast, large)
        });

        Some(Self {
            fastest: fastest.into(),
            most_content: most_content.into(),
        })
    }
}
