//! Manifest classification into clean rows and problem records.

use std::collections::HashSet;

use super::types::{MappingRow, ProblemReason, ProblemRecord, RawRecord, SanitizeOutcome};

/// Classify manifest records.
///
/// Each record lands in exactly one place:
///
/// 1. A missing field (or a key column list that parses to nothing) is
///    [`ProblemReason::MissingValue`], even when the same record repeats.
/// 2. A complete record equal to an earlier complete record is
///    [`ProblemReason::Duplicate`].
/// 3. Anything else becomes a clean [`MappingRow`].
///
/// Clean rows keep first-occurrence order and problems keep input order, so
/// the result is a pure function of the input.
pub fn sanitize(records: &[RawRecord]) -> SanitizeOutcome {
    let mut seen: HashSet<[Option<&str>; 5]> = HashSet::with_capacity(records.len());
    let mut outcome = SanitizeOutcome::default();

    for record in records {
        let Some(row) = MappingRow::from_raw(record) else {
            outcome.problems.push(ProblemRecord {
                record: record.clone(),
                reason: ProblemReason::MissingValue,
            });
            continue;
        };

        if !seen.insert(record.fields()) {
            outcome.problems.push(ProblemRecord {
                record: record.clone(),
                reason: ProblemReason::Duplicate,
            });
            continue;
        }

        outcome.clean.push(row);
    }

    outcome
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
    fn test_all_clean() {
        let records = vec![
            record(2, ["public", "orders", "id", "public", "orders"]),
            record(3, ["public", "items", "id,sku", "public", "items"]),
        ];
        let outcome = sanitize(&records);
        assert_eq!(outcome.clean.len(), 2);
        assert!(outcome.problems.is_empty());
        assert_eq!(outcome.clean[1].key_columns, vec!["id", "sku"]);
    }

    #[test]
    fn test_triple_occurrence_keeps_first() {
        let row = ["public", "orders", "id", "public", "orders"];
        let records = vec![record(2, row), record(3, row), record(4, row)];
        let outcome = sanitize(&records);

        assert_eq!(outcome.clean.len(), 1);
        assert_eq!(outcome.clean[0].line, 2);
        assert_eq!(outcome.count(ProblemReason::Duplicate), 2);
        let dup_lines: Vec<usize> = outcome.problems.iter().map(|p| p.record.line).collect();
        assert_eq!(dup_lines, vec![3, 4]);
    }

    #[test]
    fn test_repeated_missing_value_is_never_duplicate() {
        let row = ["public", "orders", "id", "public", ""];
        let records = vec![record(2, row), record(3, row)];
        let outcome = sanitize(&records);

        assert!(outcome.clean.is_empty());
        assert_eq!(outcome.count(ProblemReason::MissingValue), 2);
        assert_eq!(outcome.count(ProblemReason::Duplicate), 0);
    }

    #[test]
    fn test_empty_key_list_is_missing_value() {
        let records = vec![record(2, ["public", "orders", " , ", "public", "orders"])];
        let outcome = sanitize(&records);
        assert!(outcome.clean.is_empty());
        assert_eq!(outcome.problems[0].reason, ProblemReason::MissingValue);
    }

    #[test]
    fn test_partition_accounts_for_every_record() {
        let records = vec![
            record(2, ["a", "t1", "id", "b", "t1"]),
            record(3, ["a", "t2", "", "b", "t2"]),
            record(4, ["a", "t1", "id", "b", "t1"]),
            record(5, ["a", "t3", "id", "b", "t3"]),
            record(6, ["", "", "", "", ""]),
            record(7, ["a", "t3", "id", "b", "t3"]),
        ];
        let outcome = sanitize(&records);

        assert_eq!(outcome.clean.len() + outcome.problems.len(), records.len());
        for row in &outcome.clean {
            assert!(outcome.problems.iter().all(|p| p.record.line != row.line));
        }
        let clean_lines: Vec<usize> = outcome.clean.iter().map(|r| r.line).collect();
        assert_eq!(clean_lines, vec![2, 5]);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let records = vec![
            record(2, ["a", "t1", "id", "b", "t1"]),
            record(3, ["a", "t1", "id", "b", "t1"]),
            record(4, ["a", "t2", "id", "", "t2"]),
        ];
        assert_eq!(sanitize(&records), sanitize(&records));
    }

    #[test]
    fn test_empty_input() {
        let outcome = sanitize(&[]);
        assert!(outcome.is_empty());
        assert!(outcome.problems.is_empty());
    }
}
