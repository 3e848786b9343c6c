//! MSSQL SQL dialect (Strategy pattern).

use crate::core::traits::{Dialect, SampleOptions};
use crate::core::TableHandle;

/// MSSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    /// Create a new MSSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MssqlDialect {
    fn name(&self) -> &str {
        "mssql"
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn count_query(&self, table: &TableHandle) -> String {
        format!("SELECT COUNT_BIG(*) FROM {}", self.qualify(table))
    }

    // MSSQL puts the row limit before the column list.
    fn sample_query(&self, table: &TableHandle, opts: &SampleOptions) -> String {
        format!(
            "SELECT TOP ({}) * FROM {}{}",
            opts.limit,
            self.qualify(table),
            self.order_by_clause(opts)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        let dialect = MssqlDialect::new();
        assert_eq!(dialect.quote_ident("name"), "[name]");
        assert_eq!(dialect.quote_ident("table]name"), "[table]]name]");
        assert_eq!(dialect.quote_ident("Users"), "[Users]");
    }

    #[test]
    fn test_count_query() {
        let dialect = MssqlDialect::new();
        let table = TableHandle::new("dbo", "Users");
        assert_eq!(
            dialect.count_query(&table),
            "SELECT COUNT_BIG(*) FROM [dbo].[Users]"
        );
    }

    #[test]
    fn test_sample_query() {
        let dialect = MssqlDialect::new();
        let table = TableHandle::new("dbo", "Users");
        assert_eq!(
            dialect.sample_query(&table, &SampleOptions::default()),
            "SELECT TOP (10) * FROM [dbo].[Users]"
        );

        let opts = SampleOptions {
            limit: 2,
            order_by: vec!["Id".to_string()],
        };
        assert_eq!(
            dialect.sample_query(&table, &opts),
            "SELECT TOP (2) * FROM [dbo].[Users] ORDER BY [Id]"
        );
    }
}
