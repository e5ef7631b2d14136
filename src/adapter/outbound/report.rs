//! Report file writer.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::application::report::AnalysisReport;
use crate::error::Result;

/// Saves analysis reports as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Write reports into `dir`, creating it on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `report` to `<dir>/arbitrage_analysis_<YYYYmmdd_HHMMSS>.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub async fn write(&self, report: &AnalysisReport) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(report.file_name());
        let json = serde_json::to_string_pretty(report)?;
        tokio::fs::write(&path, json).await?;

        info!(
            path = %path.display(),
            signals = report.signals.len(),
            "Analysis report saved"
        );
        Ok(path)
    }
}
