//! Manifest record types.

use serde::{Deserialize, Serialize};

use crate::core::TableHandle;

/// Header names of the manifest columns, in report order.
pub const MANIFEST_COLUMNS: [&str; 5] = [
    "source_schema",
    "source_table",
    "column",
    "target_schema",
    "target_table",
];

/// One manifest line as read from disk, before classification.
///
/// Absent or whitespace-only fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RawRecord {
    /// 1-based line number in the manifest file (header is line 1).
    pub line: usize,
    pub source_schema: Option<String>,
    pub source_table: Option<String>,
    /// Comma-delimited key column names.
    pub column: Option<String>,
    pub target_schema: Option<String>,
    pub target_table: Option<String>,
}

impl RawRecord {
    /// Fields in manifest column order.
    pub fn fields(&self) -> [Option<&str>; 5] {
        [
            self.source_schema.as_deref(),
            self.source_table.as_deref(),
            self.column.as_deref(),
            self.target_schema.as_deref(),
            self.target_table.as_deref(),
        ]
    }

    /// Full field equality, ignoring the line number.
    pub fn same_fields(&self, other: &RawRecord) -> bool {
        self.fields() == other.fields()
    }

    /// Whether any field is absent.
    pub fn has_missing_field(&self) -> bool {
        self.fields().iter().any(Option::is_none)
    }
}

/// Split a comma-delimited key column list, trimming names and dropping empty ones.
pub fn parse_key_columns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// A validated source to target table correspondence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    /// Line number of the manifest record this row came from.
    pub line: usize,
    pub source_schema: String,
    pub source_table: String,
    pub target_schema: String,
    pub target_table: String,
    /// Key column list as written in the manifest.
    pub column: String,
    /// Key columns used for the sample comparison; never empty.
    pub key_columns: Vec<String>,
}

impl MappingRow {
    /// Build a row from a raw record, or `None` if any field is missing or
    /// the key column list is empty after parsing.
    pub fn from_raw(raw: &RawRecord) -> Option<Self> {
        let column = raw.column.as_deref()?;
        let key_columns = parse_key_columns(column);
        if key_columns.is_empty() {
            return None;
        }

        Some(Self {
            line: raw.line,
            source_schema: raw.source_schema.clone()?,
            source_table: raw.source_table.clone()?,
            target_schema: raw.target_schema.clone()?,
            target_table: raw.target_table.clone()?,
            column: column.to_string(),
            key_columns,
        })
    }

    /// Handle for the source table.
    pub fn source_handle(&self) -> TableHandle {
        TableHandle::new(&self.source_schema, &self.source_table)
    }

    /// Handle for the target table.
    pub fn target_handle(&self) -> TableHandle {
        TableHandle::new(&self.target_schema, &self.target_table)
    }
}

/// Clean, ordered set of mapping rows.
pub type Manifest = Vec<MappingRow>;

/// Why a manifest record was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemReason {
    /// Exact repeat of an earlier record.
    Duplicate,
    /// At least one field is empty or absent.
    MissingValue,
}

impl ProblemReason {
    /// Short machine tag.
    pub fn tag(&self) -> &'static str {
        match self {
            ProblemReason::Duplicate => "duplicate",
            ProblemReason::MissingValue => "missing-value",
        }
    }

    /// Text written to the `status` column of the problem report.
    pub fn report_label(&self) -> &'static str {
        match self {
            ProblemReason::Duplicate => "duplicate record",
            ProblemReason::MissingValue => "invalid record",
        }
    }
}

impl std::fmt::Display for ProblemReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A rejected manifest record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub record: RawRecord,
    pub reason: ProblemReason,
}

/// Result of sanitizing a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeOutcome {
    /// Rows safe to hand to the comparison engine.
    pub clean: Manifest,
    /// Rejected records, in input order.
    pub problems: Vec<ProblemRecord>,
}

impl SanitizeOutcome {
    /// Whether there is nothing to validate.
    pub fn is_empty(&self) -> bool {
        self.clean.is_empty()
    }

    /// Count problems with the given reason.
    pub fn count(&self, reason: ProblemReason) -> usize {
        self.problems.iter().filter(|p| p.reason == reason).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: usize, fields: [&str; 5]) -> RawRecord {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        RawRecord {
            line,
            source_schema: opt(fields[0]),
            source_table: opt(fields[1]),
            column: opt(fields[2]),
            target_schema: opt(fields[3]),
            target_table: opt(fields[4]),
        }
    }

    #[test]
    fn test_parse_key_columns() {
        assert_eq!(parse_key_columns("id"), vec!["id"]);
        assert_eq!(parse_key_columns(" id , status "), vec!["id", "status"]);
        assert_eq!(parse_key_columns("id,,status,"), vec!["id", "status"]);
        assert!(parse_key_columns(" , ").is_empty());
    }

    #[test]
    fn test_mapping_row_from_raw() {
        let raw = record(2, ["public", "orders", "id,status", "dw", "orders"]);
        let row = MappingRow::from_raw(&raw).unwrap();
        assert_eq!(row.line, 2);
        assert_eq!(row.key_columns, vec!["id", "status"]);
        assert_eq!(row.source_handle().qualified_name(), "public.orders");
        assert_eq!(row.target_handle().qualified_name(), "dw.orders");
    }

    #[test]
    fn test_mapping_row_rejects_missing_or_empty_keys() {
        assert!(MappingRow::from_raw(&record(2, ["public", "orders", "id", "dw", ""])).is_none());
        assert!(MappingRow::from_raw(&record(3, ["public", "orders", ",", "dw", "o"])).is_none());
    }

    #[test]
    fn test_same_fields_ignores_line() {
        let a = record(2, ["s", "t", "id", "s", "t"]);
        let b = record(9, ["s", "t", "id", "s", "t"]);
        assert!(a.same_fields(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_problem_reason_labels() {
        assert_eq!(ProblemReason::Duplicate.tag(), "duplicate");
        assert_eq!(ProblemReason::MissingValue.tag(), "missing-value");
        assert_eq!(ProblemReason::Duplicate.report_label(), "duplicate record");
        assert_eq!(ProblemReason::MissingValue.report_label(), "invalid record");
    }
}
