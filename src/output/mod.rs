use crate::error::Result;
use crate::runner::BenchmarkReport;
use async_trait::async_trait;

pub mod console;
pub mod csv;
pub mod json;

/// A sink for finished benchmark reports.
#[async_trait]
pub trait Reporter: Send {
    async fn write(&mut self, report: &BenchmarkReport) -> Result<()>;
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
