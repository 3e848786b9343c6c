//! Table identity used by the readers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(schema, table)` pair on one side of a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableHandle {
    /// Schema (or database, for MySQL) name.
    pub schema: String,
    /// Table name.
    pub table: String,
}

impl TableHandle {
    /// Create a new table handle.
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Unquoted fully-qualified name (`schema.table`), for logs and reports.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// Fully-qualified name with each part passed through a dialect quoting function.
    pub fn quoted_with(&self, quote: impl Fn(&str) -> String) -> String {
        format!("{}.{}", quote(&self.schema), quote(&self.table))
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        let handle = TableHandle::new("public", "orders");
        assert_eq!(handle.qualified_name(), "public.orders");
        assert_eq!(handle.to_string(), "public.orders");
    }

    #[test]
    fn test_quoted_with() {
        let handle = TableHandle::new("sales", "order\"items");
        let quoted = handle.quoted_with(|s| format!("\"{}\"", s.replace('"', "\"\"")));
        assert_eq!(quoted, "\"sales\".\"order\"\"items\"");
    }
}
