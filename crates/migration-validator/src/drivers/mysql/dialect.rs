//! MySQL/MariaDB SQL dialect (Strategy pattern).
//!
//! MySQL has no schemas separate from databases, so the schema part of a
//! [`TableHandle`] names the database.

use crate::core::traits::{Dialect, SampleOptions};
use crate::core::TableHandle;

/// MySQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn count_query(&self, table: &TableHandle) -> String {
        format!("SELECT COUNT(*) AS cnt FROM {}", self.qualify(table))
    }

    fn sample_query(&self, table: &TableHandle, opts: &SampleOptions) -> String {
        format!(
            "SELECT * FROM {}{} LIMIT {}",
            self.qualify(table),
            self.order_by_clause(opts),
            opts.limit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        let dialect = MysqlDialect::new();
        assert_eq!(dialect.quote_ident("users"), "`users`");
        assert_eq!(dialect.quote_ident("my`table"), "`my``table`");
    }

    #[test]
    fn test_queries() {
        let dialect = MysqlDialect::new();
        let table = TableHandle::new("sales", "orders");
        assert_eq!(
            dialect.count_query(&table),
            "SELECT COUNT(*) AS cnt FROM `sales`.`orders`"
        );
        assert_eq!(
            dialect.sample_query(&table, &SampleOptions::with_limit(3)),
            "SELECT * FROM `sales`.`orders` LIMIT 3"
        );
    }

    #[test]
    fn test_sample_query_ordered() {
        let dialect = MysqlDialect::new();
        let table = TableHandle::new("sales", "orders");
        let opts = SampleOptions {
            limit: 10,
            order_by: vec!["id".to_string()],
        };
        assert_eq!(
            dialect.sample_query(&table, &opts),
            "SELECT * FROM `sales`.`orders` ORDER BY `id` LIMIT 10"
        );
    }
}
