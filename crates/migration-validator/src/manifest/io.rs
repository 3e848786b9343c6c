//! Manifest CSV reading and problem report writing.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{ProblemRecord, RawRecord, MANIFEST_COLUMNS};
use crate::error::{Result, ValidateError};

/// File name of the problem report, written next to the manifest.
pub const PROBLEM_REPORT_FILE: &str = "invalidfile.txt";

/// Header of the problem report.
pub const PROBLEM_REPORT_HEADER: [&str; 6] = [
    "source_schema",
    "source_table",
    "column",
    "target_schema",
    "target_table",
    "status",
];

/// Path of the problem report for a manifest.
pub fn problem_report_path(manifest_path: &Path) -> PathBuf {
    manifest_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(PROBLEM_REPORT_FILE)
}

/// Read a manifest CSV.
///
/// Columns are located by header name, ignoring case and order. Lines with
/// fewer fields than the header are accepted; the missing fields are `None`.
pub fn read_manifest(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let positions = locate_columns(&headers)?;

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row = result?;
        let field = |pos: usize| {
            row.get(pos)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);

        records.push(RawRecord {
            line,
            source_schema: field(positions[0]),
            source_table: field(positions[1]),
            column: field(positions[2]),
            target_schema: field(positions[3]),
            target_table: field(positions[4]),
        });
    }

    debug!("Read {} manifest records from {:?}", records.len(), path);
    Ok(records)
}

fn locate_columns(headers: &csv::StringRecord) -> Result<[usize; 5]> {
    let mut positions = [0usize; 5];
    for (slot, name) in positions.iter_mut().zip(MANIFEST_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                ValidateError::Manifest(format!(
                    "missing required column '{}' (found: {})",
                    name,
                    headers.iter().collect::<Vec<_>>().join(", ")
                ))
            })?;
    }
    Ok(positions)
}

/// Write the problem report, replacing any previous report.
///
/// The header is always written, so an empty problem list leaves a
/// header-only file.
pub fn write_problem_report(path: &Path, problems: &[ProblemRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(PROBLEM_REPORT_HEADER)?;

    for problem in problems {
        let mut fields: Vec<&str> = problem
            .record
            .fields()
            .iter()
            .map(|f| f.unwrap_or(""))
            .collect();
        fields.push(problem.reason.report_label());
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    Ok(())
}
