//! Report emission.
//!
//! Verdicts are streamed to a [`VerdictSink`] as the engine produces them,
//! and the whole run is summarized into a [`ValidationSummary`] that is
//! written to the report directory as JSON.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::compare::{Status, Verdict};
use crate::error::Result;

/// Timestamp format used in result file names.
pub const RESULTS_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Receives verdicts in manifest order, one call per row.
pub trait VerdictSink: Send + Sync {
    fn emit(&self, verdict: &Verdict);
}

/// Logs one line per verdict through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl VerdictSink for LogSink {
    fn emit(&self, verdict: &Verdict) {
        let status = verdict.status();
        match status {
            Status::Pass => info!(
                "{} line {}: {} ({}) [{}ms]",
                status, verdict.row.line, verdict.row, verdict.outcome, verdict.duration_ms
            ),
            Status::Fail | Status::Skip => warn!(
                "{} line {}: {} ({}) [{}ms]",
                status, verdict.row.line, verdict.row, verdict.outcome, verdict.duration_ms
            ),
        }
    }
}

/// Counts per status plus every verdict of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub project: String,
    pub subproject: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub verdicts: Vec<Verdict>,
}

impl ValidationSummary {
    /// Summarize a list of verdicts.
    pub fn from_verdicts(
        project: impl Into<String>,
        subproject: impl Into<String>,
        verdicts: Vec<Verdict>,
    ) -> Self {
        let count = |status: Status| verdicts.iter().filter(|v| v.status() == status).count();
        Self {
            project: project.into(),
            subproject: subproject.into(),
            total: verdicts.len(),
            passed: count(Status::Pass),
            failed: count(Status::Fail),
            skipped: count(Status::Skip),
            verdicts,
        }
    }

    /// Whether any row failed validation.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Verdicts with the given status.
    pub fn with_status(&self, status: Status) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(move |v| v.status() == status)
    }
}

/// File name for a results document.
pub fn results_file_name(project: &str, subproject: &str, at: NaiveDateTime) -> String {
    let clean = |s: &str| s.replace(['/', '\\'], "_");
    format!(
        "{}_{}_{}.json",
        clean(project),
        clean(subproject),
        at.format(RESULTS_TIMESTAMP_FORMAT)
    )
}

/// Write the summary as pretty JSON into `report_dir`, creating it if needed.
pub fn write_results(report_dir: &Path, summary: &ValidationSummary) -> Result<PathBuf> {
    std::fs::create_dir_all(report_dir)?;
    let path = report_dir.join(results_file_name(
        &summary.project,
        &summary.subproject,
        Local::now().naive_local(),
    ));
    std::fs::write(&path, serde_json::to_string_pretty(summary)?)?;
    info!("Results written to {:?}", path);
    Ok(path)
}
