//! Manifest sanitizer.
//!
//! Turns the user-supplied table mapping CSV into a clean [`Manifest`] and a
//! problem report (`invalidfile.txt`) listing every rejected record.

mod io;
mod sanitize;
mod types;

use std::path::Path;

use tracing::{error, info, warn};

pub use io::{
    problem_report_path, read_manifest, write_problem_report, PROBLEM_REPORT_FILE,
    PROBLEM_REPORT_HEADER,
};
pub use sanitize::sanitize;
pub use types::{
    parse_key_columns, Manifest, MappingRow, ProblemReason, ProblemRecord, RawRecord,
    SanitizeOutcome, MANIFEST_COLUMNS,
};

/// Read, classify and report on a manifest file.
///
/// An unreadable or malformed manifest yields an empty outcome and no
/// report. A report that cannot be written is logged; the clean rows are
/// still returned.
pub fn sanitize_manifest(path: &Path) -> SanitizeOutcome {
    let records = match read_manifest(path) {
        Ok(records) => records,
        Err(e) => {
            warn!("Could not read manifest {:?}: {}", path, e);
            return SanitizeOutcome::default();
        }
    };

    let outcome = sanitize(&records);

    let report_path = problem_report_path(path);
    if let Err(e) = write_problem_report(&report_path, &outcome.problems) {
        error!("Failed to write problem report {:?}: {}", report_path, e);
    }

    info!(
        "Manifest {:?}: {} records, {} clean, {} duplicate, {} missing-value",
        path,
        records.len(),
        outcome.clean.len(),
        outcome.count(ProblemReason::Duplicate),
        outcome.count(ProblemReason::MissingValue)
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_manifest_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("tables.csv");
        std::fs::write(
            &manifest,
            "source_schema,source_table,column,target_schema,target_table\n\
             public,orders,id,public,orders\n\
             public,orders,id,public,orders\n\
             public,items,id,public,\n\
             public,users,\"id,email\",public,users\n",
        )
        .unwrap();

        let outcome = sanitize_manifest(&manifest);
        assert_eq!(outcome.clean.len(), 2);
        assert_eq!(outcome.clean[1].key_columns, vec!["id", "email"]);
        assert_eq!(outcome.problems.len(), 2);

        let report = std::fs::read_to_string(dir.path().join(PROBLEM_REPORT_FILE)).unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with("duplicate record"));
        assert!(lines[2].ends_with("invalid record"));
    }

    #[test]
    fn test_single_incomplete_record_yields_nothing_to_validate() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("tables.csv");
        std::fs::write(
            &manifest,
            "source_schema,source_table,column,target_schema,target_table\n\
             s,t,,s,t\n",
        )
        .unwrap();

        let outcome = sanitize_manifest(&manifest);
        assert!(outcome.is_empty());
        assert_eq!(outcome.problems.len(), 1);
        assert_eq!(outcome.problems[0].reason, ProblemReason::MissingValue);

        let report = std::fs::read_to_string(dir.path().join(PROBLEM_REPORT_FILE)).unwrap();
        assert_eq!(report.lines().nth(1), Some("s,t,,s,t,invalid record"));
    }

    #[test]
    fn test_unreadable_manifest_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("missing.csv");

        let outcome = sanitize_manifest(&manifest);
        assert!(outcome.is_empty());
        assert!(outcome.problems.is_empty());
        assert!(!dir.path().join(PROBLEM_REPORT_FILE).exists());
    }
}
