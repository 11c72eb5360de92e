use super::Reporter;
use crate::error::Result;
use crate::result::ResultRecord;
use crate::runner::BenchmarkReport;
use async_trait::async_trait;
use std::path::PathBuf;

/// One row per backend, in the flat result shape.
pub struct CsvReporter {
    writer: csv::Writer<std::fs::File>,
    headers_written: bool,
}

impl CsvReporter {
    pub fn new(path: PathBuf) -> Result<Self> {
        let writer = csv::Writer::from_path(path)?;

        Ok(Self {
            writer,
            headers_written: false,
        })
    }
}

#[async_trait]
impl Reporter for CsvReporter {
    async fn write(&mut self, report: &BenchmarkReport) -> Result<()> {
        if !self.headers_written {
            self.writer.write_record([
                "url",
                "tool_name",
                "time_taken",
                "content_length",
                "content_snippet",
                "error",
            ])?;
            self.headers_written = true;
        }

        for result in &report.results {
            let record = ResultRecord::from(result.clone());
            self.writer.write_record([
                report.url.clone(),
                record.tool_name,
                record.time_taken.to_string(),
                record.content_length.to_string(),
                record.content_snippet,
                record.error.unwrap_or_default(),
            ])?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
