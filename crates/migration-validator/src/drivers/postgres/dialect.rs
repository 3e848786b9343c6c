//! PostgreSQL SQL dialect (Strategy pattern).
//!
//! Also used for Greenplum, which speaks the PostgreSQL protocol and syntax.

use crate::core::traits::{Dialect, SampleOptions};
use crate::core::TableHandle;

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn count_query(&self, table: &TableHandle) -> String {
        format!("SELECT COUNT(*)::int8 FROM {}", self.qualify(table))
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
