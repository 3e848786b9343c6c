//! SQL value types for sampled rows.
//!
//! Sample rows are read from engines with different type systems, so each
//! driver converts its native cells into [`SqlValue`] before the comparison
//! engine sees them.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Type hint carried by NULL cells.
///
/// Two NULLs are the same value regardless of their hint; the hint only
/// records which column type produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlNullType {
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Bytes,
    Uuid,
    Decimal,
    DateTime,
    DateTimeOffset,
    Date,
    Time,
}

/// SQL value enum for type-safe row handling.
///
/// Uses `Cow` for string and byte data so drivers that can hand out
/// borrowed cells don't have to allocate twice.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue<'a> {
    /// NULL with type hint.
    Null(SqlNullType),

    /// Boolean value.
    Bool(bool),

    /// 16-bit signed integer (smallint, tinyint).
    I16(i16),

    /// 32-bit signed integer (int).
    I32(i32),

    /// 64-bit signed integer (bigint).
    I64(i64),

    /// 32-bit floating point (real/float4).
    F32(f32),

    /// 64-bit floating point (double precision/float8).
    F64(f64),

    /// Text/string data.
    Text(Cow<'a, str>),

    /// Binary data.
    Bytes(Cow<'a, [u8]>),

    /// UUID/GUID value.
    Uuid(Uuid),

    /// Decimal value with arbitrary precision.
    Decimal(Decimal),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Timestamp with timezone offset.
    DateTimeOffset(DateTime<FixedOffset>),

    /// Date without time component.
    Date(NaiveDate),

    /// Time without date component.
    Time(NaiveTime),
}

impl<'a> SqlValue<'a> {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }

    /// Integer view of the value, if it is any integer width.
    fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::I16(v) => Some(i64::from(*v)),
            SqlValue::I32(v) => Some(i64::from(*v)),
            SqlValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Compare two cells for sample equality.
    ///
    /// Integers are compared after widening, so a source `int` and a target
    /// `bigint` holding the same number agree. NULLs agree with NULLs and
    /// NaN agrees with NaN. Any other pair must be the same variant with an
    /// equal payload.
    #[must_use]
    pub fn same_value(&self, other: &SqlValue<'_>) -> bool {
        if let (Some(a), Some(b)) = (self.as_i64(), other.as_i64()) {
            return a == b;
        }

        match (self, other) {
            (SqlValue::Null(_), SqlValue::Null(_)) => true,
            (SqlValue::Bool(a), SqlValue::Bool(b)) => a == b,
            (SqlValue::F32(a), SqlValue::F32(b)) => a == b || (a.is_nan() && b.is_nan()),
            (SqlValue::F64(a), SqlValue::F64(b)) => a == b || (a.is_nan() && b.is_nan()),
            (SqlValue::Text(a), SqlValue::Text(b)) => a == b,
            (SqlValue::Bytes(a), SqlValue::Bytes(b)) => a == b,
            (SqlValue::Uuid(a), SqlValue::Uuid(b)) => a == b,
            (SqlValue::Decimal(a), SqlValue::Decimal(b)) => a == b,
            (SqlValue::DateTime(a), SqlValue::DateTime(b)) => a == b,
            (SqlValue::DateTimeOffset(a), SqlValue::DateTimeOffset(b)) => a == b,
            (SqlValue::Date(a), SqlValue::Date(b)) => a == b,
            (SqlValue::Time(a), SqlValue::Time(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for SqlValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null(_) => write!(f, "NULL"),
            SqlValue::Bool(v) => write!(f, "{}", v),
            SqlValue::I16(v) => write!(f, "{}", v),
            SqlValue::I32(v) => write!(f, "{}", v),
            SqlValue::I64(v) => write!(f, "{}", v),
            SqlValue::F32(v) => write!(f, "{}", v),
            SqlValue::F64(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "{}", v),
            SqlValue::Bytes(v) => {
                write!(f, "0x")?;
                for b in v.iter() {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            SqlValue::Uuid(v) => write!(f, "{}", v),
            SqlValue::Decimal(v) => write!(f, "{}", v),
            SqlValue::DateTime(v) => write!(f, "{}", v),
            SqlValue::DateTimeOffset(v) => write!(f, "{}", v),
            SqlValue::Date(v) => write!(f, "{}", v),
            SqlValue::Time(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for SqlValue<'static> {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i16> for SqlValue<'static> {
    fn from(v: i16) -> Self {
        SqlValue::I16(v)
    }
}

impl From<i32> for SqlValue<'static> {
    fn from(v: i32) -> Self {
        SqlValue::I32(v)
    }
}

impl From<i64> for SqlValue<'static> {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f64> for SqlValue<'static> {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<String> for SqlValue<'static> {
    fn from(v: String) -> Self {
        SqlValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a str> for SqlValue<'a> {
    fn from(v: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for SqlValue<'static> {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(Cow::Owned(v))
    }
}

impl From<Uuid> for SqlValue<'static> {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<Decimal> for SqlValue<'static> {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<NaiveDateTime> for SqlValue<'static> {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<NaiveDate> for SqlValue<'static> {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

/// Rows returned by a sample query, in the order the engine returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    /// Column names as reported by the driver.
    pub columns: Vec<String>,

    /// Row values, positionally aligned with `columns`.
    pub rows: Vec<Vec<SqlValue<'static>>>,
}

impl SampleSet {
    /// Create a sample from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue<'static>>>) -> Self {
        Self { columns, rows }
    }

    /// Number of sampled rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the sample has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matching exactly first and then ignoring ASCII case.
    ///
    /// PostgreSQL folds unquoted identifiers to lower case while MSSQL and
    /// MySQL keep the declared spelling, so manifests written against one
    /// engine still resolve on the other.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }

    /// Cell at a row and column position.
    pub fn value(&self, row: usize, col: usize) -> Option<&SqlValue<'static>> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_is_null() {
        assert!(SqlValue::<'static>::Null(SqlNullType::String).is_null());
        assert!(!SqlValue::I32(42).is_null());
    }

    #[test]
    fn test_same_value_widens_integers() {
        assert!(SqlValue::I32(7).same_value(&SqlValue::I64(7)));
        assert!(SqlValue::I16(-3).same_value(&SqlValue::I32(-3)));
        assert!(!SqlValue::I32(7).same_value(&SqlValue::I64(8)));
    }

    #[test]
    fn test_same_value_nulls_ignore_type_hint() {
        let a = SqlValue::Null(SqlNullType::I32);
        let b = SqlValue::Null(SqlNullType::String);
        assert!(a.same_value(&b));
        assert!(!a.same_value(&SqlValue::I32(0)));
    }

    #[test]
    fn test_same_value_nan_matches_nan() {
        assert!(SqlValue::F64(f64::NAN).same_value(&SqlValue::F64(f64::NAN)));
        assert!(SqlValue::F32(f32::NAN).same_value(&SqlValue::F32(f32::NAN)));
        assert!(!SqlValue::F64(f64::NAN).same_value(&SqlValue::F64(0.0)));
    }

    #[test]
    fn test_same_value_does_not_coerce_across_types() {
        let text: SqlValue<'static> = "1".into();
        assert!(!text.same_value(&SqlValue::I32(1)));
        assert!(!SqlValue::F64(1.0).same_value(&SqlValue::I64(1)));
    }

    #[test]
    fn test_display() {
        assert_eq!(SqlValue::Null(SqlNullType::I64).to_string(), "NULL");
        assert_eq!(SqlValue::from("shipped").to_string(), "shipped");
        assert_eq!(SqlValue::from(vec![0xde, 0xad]).to_string(), "0xdead");
    }

    #[test]
    fn test_sample_column_index_case_fallback() {
        let sample = SampleSet::new(
            vec!["ID".to_string(), "status".to_string(), "Status".to_string()],
            vec![],
        );
        assert_eq!(sample.column_index("ID"), Some(0));
        assert_eq!(sample.column_index("id"), Some(0));
        // Exact match wins over a case-insensitive one earlier in the list
        assert_eq!(sample.column_index("Status"), Some(2));
        assert_eq!(sample.column_index("missing"), None);
    }

    #[test]
    fn test_from_implementations() {
        let v: SqlValue<'static> = 42i32.into();
        assert_eq!(v, SqlValue::I32(42));

        let v: SqlValue<'static> = "hello".to_string().into();
        assert_eq!(v, SqlValue::Text(Cow::Owned("hello".to_string())));
    }
}
