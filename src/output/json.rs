use super::Reporter;
use crate::error::Result;
use crate::runner::BenchmarkReport;
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Writes each report as a pretty-printed JSON document.
pub struct JsonReporter {
    file: File,
}

impl JsonReporter {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self { file })
    }
}

#[async_trait]
impl Reporter for JsonReporter {
    async fn write(&mut self, report: &BenchmarkReport) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.file, report)?;
        writeln!(self.file)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}
