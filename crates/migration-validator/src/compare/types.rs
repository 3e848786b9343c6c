//! Verdict types produced by the comparison engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::manifest::MappingRow;

/// Maximum number of differing cells carried in a [`ColumnMismatch::Values`].
pub const MAX_REPORTED_MISMATCHES: usize = 20;

/// Which database a fetch was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// Step of the per-row protocol at which a fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStage {
    Count,
    Sample,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStage::Count => write!(f, "count"),
            FetchStage::Sample => write!(f, "sample"),
        }
    }
}

/// Coarse result of a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
    Skip,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => write!(f, "PASS"),
            Status::Fail => write!(f, "FAIL"),
            Status::Skip => write!(f, "SKIP"),
        }
    }
}

/// Identity of the mapping row a verdict belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIdentity {
    /// Manifest line number.
    pub line: usize,
    /// Unquoted `schema.table` on the source.
    pub source: String,
    /// Unquoted `schema.table` on the target.
    pub target: String,
    pub key_columns: Vec<String>,
}

impl From<&MappingRow> for RowIdentity {
    fn from(row: &MappingRow) -> Self {
        Self {
            line: row.line,
            source: row.source_handle().qualified_name(),
            target: row.target_handle().qualified_name(),
            key_columns: row.key_columns.clone(),
        }
    }
}

impl fmt::Display for RowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// One differing cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMismatch {
    /// 0-based position within the sample.
    pub row: usize,
    pub column: String,
    /// Rendered source value.
    pub source: String,
    /// Rendered target value.
    pub target: String,
}

/// Why the key-column comparison failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnMismatch {
    /// The samples have different row counts.
    SampleLength {
        source_rows: usize,
        target_rows: usize,
    },
    /// Key columns absent from one side's sample.
    MissingColumns { side: Side, columns: Vec<String> },
    /// Cells differ. At most [`MAX_REPORTED_MISMATCHES`] are kept; `total`
    /// counts all of them.
    Values {
        mismatches: Vec<ValueMismatch>,
        total: usize,
    },
}

impl fmt::Display for ColumnMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnMismatch::SampleLength {
                source_rows,
                target_rows,
            } => write!(
                f,
                "sample length differs (source={}, target={})",
                source_rows, target_rows
            ),
            ColumnMismatch::MissingColumns { side, columns } => {
                write!(f, "{} is missing key columns: {}", side, columns.join(", "))
            }
            ColumnMismatch::Values { mismatches, total } => {
                write!(f, "{} differing values", total)?;
                if let Some(first) = mismatches.first() {
                    write!(
                        f,
                        " (first: row {} column {}: {} vs {})",
                        first.row, first.column, first.source, first.target
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// What happened to one mapping row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Outcome {
    Passed {
        rows_compared: usize,
    },
    FailedCountMismatch {
        source_count: i64,
        target_count: i64,
    },
    FailedColumnMismatch {
        detail: ColumnMismatch,
    },
    SkippedEmptyTable {
        source_count: i64,
        target_count: i64,
    },
    SkippedFetchError {
        stage: FetchStage,
        side: Side,
        message: String,
    },
}

impl Outcome {
    pub fn status(&self) -> Status {
        match self {
            Outcome::Passed { .. } => Status::Pass,
            Outcome::FailedCountMismatch { .. } | Outcome::FailedColumnMismatch { .. } => {
                Status::Fail
            }
            Outcome::SkippedEmptyTable { .. } | Outcome::SkippedFetchError { .. } => Status::Skip,
        }
    }

    /// Variant name, as used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Passed { .. } => "Passed",
            Outcome::FailedCountMismatch { .. } => "FailedCountMismatch",
            Outcome::FailedColumnMismatch { .. } => "FailedColumnMismatch",
            Outcome::SkippedEmptyTable { .. } => "SkippedEmptyTable",
            Outcome::SkippedFetchError { .. } => "SkippedFetchError",
        }
    }

    pub(crate) fn fetch_error(stage: FetchStage, side: Side, message: impl ToString) -> Self {
        Outcome::SkippedFetchError {
            stage,
            side,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed { rows_compared } => {
                write!(f, "{} sampled rows match", rows_compared)
            }
            Outcome::FailedCountMismatch {
                source_count,
                target_count,
            } => write!(
                f,
                "row count mismatch (source={}, target={})",
                source_count, target_count
            ),
            Outcome::FailedColumnMismatch { detail } => write!(f, "column mismatch: {}", detail),
            Outcome::SkippedEmptyTable {
                source_count,
                target_count,
            } => write!(
                f,
                "empty table (source={}, target={})",
                source_count, target_count
            ),
            Outcome::SkippedFetchError {
                stage,
                side,
                message,
            } => write!(f, "{} fetch failed on {}: {}", stage, side, message),
        }
    }
}

/// Result of validating one mapping row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub row: RowIdentity,
    pub outcome: Outcome,
    pub duration_ms: u64,
}

impl Verdict {
    pub fn status(&self) -> Status {
        self.outcome.status()
    }
}

/// Verdicts of one engine run, in manifest order.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub verdicts: Vec<Verdict>,
    /// Whether the run stopped early on cancellation.
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_status() {
        assert_eq!(Outcome::Passed { rows_compared: 10 }.status(), Status::Pass);
        assert_eq!(
            Outcome::FailedCountMismatch {
                source_count: 1,
                target_count: 2
            }
            .status(),
            Status::Fail
        );
        assert_eq!(
            Outcome::fetch_error(FetchStage::Count, Side::Target, "timeout").status(),
            Status::Skip
        );
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let outcome = Outcome::FailedCountMismatch {
            source_count: 100,
            target_count: 98,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["verdict"], "failed_count_mismatch");
        assert_eq!(json["source_count"], 100);
        assert_eq!(json["target_count"], 98);
    }

    #[test]
    fn test_column_mismatch_serializes_with_kind() {
        let outcome = Outcome::FailedColumnMismatch {
            detail: ColumnMismatch::MissingColumns {
                side: Side::Target,
                columns: vec!["id".to_string()],
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["detail"]["kind"], "missing_columns");
        assert_eq!(json["detail"]["side"], "target");
    }

    #[test]
    fn test_outcome_display() {
        let outcome = Outcome::fetch_error(FetchStage::Sample, Side::Source, "empty sample");
        assert_eq!(outcome.to_string(), "sample fetch failed on source: empty sample");
        assert_eq!(outcome.name(), "SkippedFetchError");
        assert_eq!(Status::Skip.to_string(), "SKIP");
    }
}
