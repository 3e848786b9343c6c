//! Key-column comparison of two samples.

use crate::core::{SampleSet, SqlValue};

use super::types::{ColumnMismatch, Side, ValueMismatch, MAX_REPORTED_MISMATCHES};

/// Rendering of a cell absent from a short row.
const MISSING_CELL: &str = "<missing>";

/// Compare the key columns of two samples positionally.
///
/// Row `i` of the source sample is compared with row `i` of the target
/// sample, column by column, in `key_columns` order. Returns the number of
/// rows compared when every cell agrees.
pub fn compare_key_columns(
    source: &SampleSet,
    target: &SampleSet,
    key_columns: &[String],
) -> Result<usize, ColumnMismatch> {
    if source.len() != target.len() {
        return Err(ColumnMismatch::SampleLength {
            source_rows: source.len(),
            target_rows: target.len(),
        });
    }

    let source_idx = resolve_columns(source, key_columns, Side::Source)?;
    let target_idx = resolve_columns(target, key_columns, Side::Target)?;

    let mut mismatches = Vec::new();
    let mut total = 0usize;

    for row in 0..source.len() {
        for (k, column) in key_columns.iter().enumerate() {
            let s = source.value(row, source_idx[k]);
            let t = target.value(row, target_idx[k]);
            let same = match (s, t) {
                (Some(s), Some(t)) => s.same_value(t),
                // Short row from the driver
                _ => false,
            };

            if !same {
                total += 1;
                if mismatches.len() < MAX_REPORTED_MISMATCHES {
                    mismatches.push(ValueMismatch {
                        row,
                        column: column.clone(),
                        source: render(s),
                        target: render(t),
                    });
                }
            }
        }
    }

    if total > 0 {
        return Err(ColumnMismatch::Values { mismatches, total });
    }
    Ok(source.len())
}

fn render(value: Option<&SqlValue<'static>>) -> String {
    value.map_or_else(|| MISSING_CELL.to_string(), ToString::to_string)
}

fn resolve_columns(
    sample: &SampleSet,
    key_columns: &[String],
    side: Side,
) -> Result<Vec<usize>, ColumnMismatch> {
    let mut indices = Vec::with_capacity(key_columns.len());
    let mut missing = Vec::new();

    for column in key_columns {
        match sample.column_index(column) {
            Some(idx) => indices.push(idx),
            None => missing.push(column.clone()),
        }
    }

    if missing.is_empty() {
        Ok(indices)
    } else {
        Err(ColumnMismatch::MissingColumns {
            side,
            columns: missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SqlNullType;

    fn sample(columns: &[&str], rows: Vec<Vec<SqlValue<'static>>>) -> SampleSet {
        SampleSet::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_equal_samples_pass() {
        let source = sample(
            &["id", "status", "note"],
            vec![
                vec![1i32.into(), "open".into(), "a".into()],
                vec![2i32.into(), "shipped".into(), "b".into()],
            ],
        );
        // Non-key columns may differ and column order may differ
        let target = sample(
            &["note", "status", "id"],
            vec![
                vec!["x".into(), "open".into(), 1i64.into()],
                vec!["y".into(), "shipped".into(), 2i64.into()],
            ],
        );

        assert_eq!(compare_key_columns(&source, &target, &keys(&["id", "status"])), Ok(2));
    }

    #[test]
    fn test_reordered_rows_fail() {
        let source = sample(&["id"], vec![vec![1i32.into()], vec![2i32.into()]]);
        let target = sample(&["id"], vec![vec![2i32.into()], vec![1i32.into()]]);

        match compare_key_columns(&source, &target, &keys(&["id"])) {
            Err(ColumnMismatch::Values { mismatches, total }) => {
                assert_eq!(total, 2);
                assert_eq!(mismatches[0].row, 0);
                assert_eq!(mismatches[0].source, "1");
                assert_eq!(mismatches[0].target, "2");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_length_mismatch_fails_before_values() {
        let source = sample(&["id"], vec![vec![1i32.into()], vec![2i32.into()]]);
        let target = sample(&["id"], vec![vec![1i32.into()]]);

        assert_eq!(
            compare_key_columns(&source, &target, &keys(&["id"])),
            Err(ColumnMismatch::SampleLength {
                source_rows: 2,
                target_rows: 1
            })
        );
    }

    #[test]
    fn test_missing_key_column() {
        let source = sample(&["id", "status"], vec![vec![1i32.into(), "a".into()]]);
        let target = sample(&["id"], vec![vec![1i32.into()]]);

        assert_eq!(
            compare_key_columns(&source, &target, &keys(&["id", "status"])),
            Err(ColumnMismatch::MissingColumns {
                side: Side::Target,
                columns: vec!["status".to_string()]
            })
        );
    }

    #[test]
    fn test_case_insensitive_column_lookup() {
        let source = sample(&["OrderId"], vec![vec![5i32.into()]]);
        let target = sample(&["orderid"], vec![vec![5i32.into()]]);
        assert_eq!(compare_key_columns(&source, &target, &keys(&["OrderId"])), Ok(1));
    }

    #[test]
    fn test_nulls_match_and_no_coercion() {
        let source = sample(
            &["id", "code"],
            vec![vec![SqlValue::Null(SqlNullType::I32), "7".into()]],
        );
        let target = sample(
            &["id", "code"],
            vec![vec![SqlValue::Null(SqlNullType::I64), 7i32.into()]],
        );

        match compare_key_columns(&source, &target, &keys(&["id", "code"])) {
            Err(ColumnMismatch::Values { mismatches, total }) => {
                assert_eq!(total, 1);
                assert_eq!(mismatches[0].column, "code");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_reported_mismatches_are_capped() {
        let rows = |offset: i32| -> Vec<Vec<SqlValue<'static>>> {
            (0..30).map(|i| vec![SqlValue::I32(i + offset)]).collect()
        };
        let source = sample(&["id"], rows(0));
        let target = sample(&["id"], rows(1000));

        match compare_key_columns(&source, &target, &keys(&["id"])) {
            Err(ColumnMismatch::Values { mismatches, total }) => {
                assert_eq!(total, 30);
                assert_eq!(mismatches.len(), MAX_REPORTED_MISMATCHES);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_nan_in_same_position_matches() {
        let source = sample(&["id", "price"], vec![vec![1i32.into(), SqlValue::F64(f64::NAN)]]);
        let target = sample(&["id", "price"], vec![vec![1i32.into(), SqlValue::F64(f64::NAN)]]);
        assert_eq!(compare_key_columns(&source, &target, &keys(&["id", "price"])), Ok(1));

        let source = sample(&["ratio"], vec![vec![SqlValue::F32(f32::NAN)]]);
        let target = sample(&["ratio"], vec![vec![SqlValue::F32(f32::NAN)]]);
        assert_eq!(compare_key_columns(&source, &target, &keys(&["ratio"])), Ok(1));
    }

    #[test]
    fn test_nan_against_number_fails() {
        let source = sample(&["price"], vec![vec![SqlValue::F64(f64::NAN)]]);
        let target = sample(&["price"], vec![vec![SqlValue::F64(1.5)]]);
        assert!(compare_key_columns(&source, &target, &keys(&["price"])).is_err());
    }

    #[test]
    fn test_short_row_is_listed() {
        let source = sample(&["id", "status"], vec![vec![1i32.into(), "open".into()]]);
        let target = sample(&["id", "status"], vec![vec![1i32.into()]]);

        match compare_key_columns(&source, &target, &keys(&["id", "status"])) {
            Err(ColumnMismatch::Values { mismatches, total }) => {
                assert_eq!(total, 1);
                assert_eq!(mismatches.len(), 1);
                assert_eq!(mismatches[0].column, "status");
                assert_eq!(mismatches[0].source, "open");
                assert_eq!(mismatches[0].target, MISSING_CELL);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
