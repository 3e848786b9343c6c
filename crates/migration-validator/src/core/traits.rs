//! Core traits for the validation pipeline.
//!
//! - [`Dialect`]: SQL syntax strategy for count and sample queries
//! - [`TableReader`]: count and sample queries against one database
//! - [`CredentialResolver`]: connection id to connection parameters
//!
//! The comparison engine only ever sees these traits, so no SQL dialect
//! leaks into it and tests can substitute in-memory implementations.

use async_trait::async_trait;

use crate::credentials::ConnectionParams;
use crate::error::Result;

use super::table::TableHandle;
use super::value::SampleSet;

/// Default number of rows fetched per sample.
pub const DEFAULT_SAMPLE_LIMIT: usize = 10;

/// Options for a sample query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleOptions {
    /// Maximum number of rows to return.
    pub limit: usize,
    /// Columns to order by. Empty means engine order (no ORDER BY).
    pub order_by: Vec<String>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SAMPLE_LIMIT,
            order_by: Vec::new(),
        }
    }
}

impl SampleOptions {
    /// Sample options with the given row limit and no ordering.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            order_by: Vec::new(),
        }
    }
}

/// SQL dialect strategy.
///
/// Each driver provides one; readers build every statement through it.
pub trait Dialect: Send + Sync {
    /// Dialect name (e.g., "postgres").
    fn name(&self) -> &str;

    /// Quote a single identifier, escaping embedded quote characters.
    fn quote_ident(&self, name: &str) -> String;

    /// Quoted `schema.table`.
    fn qualify(&self, table: &TableHandle) -> String {
        table.quoted_with(|part| self.quote_ident(part))
    }

    /// Statement returning the row count of a table as a single 64-bit integer.
    fn count_query(&self, table: &TableHandle) -> String;

    /// Statement returning up to `opts.limit` rows with all columns.
    fn sample_query(&self, table: &TableHandle, opts: &SampleOptions) -> String;

    /// `ORDER BY` clause for the requested columns, or an empty string.
    fn order_by_clause(&self, opts: &SampleOptions) -> String {
        if opts.order_by.is_empty() {
            return String::new();
        }
        let cols = opts
            .order_by
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(" ORDER BY {}", cols)
    }
}

/// Read-only access to tables on one database.
///
/// Implementations wrap a connection pool opened once per run and shared
/// across all manifest rows. No implementation writes to the database.
#[async_trait]
pub trait TableReader: Send + Sync {
    /// Count all rows in a table.
    async fn count(&self, table: &TableHandle) -> Result<i64>;

    /// Fetch up to `opts.limit` rows with all columns.
    async fn sample(&self, table: &TableHandle, opts: &SampleOptions) -> Result<SampleSet>;

    /// Run a trivial query to confirm the connection works.
    async fn test_connection(&self) -> Result<()>;

    /// Get the database type identifier (e.g., "mssql", "postgres").
    fn db_type(&self) -> &str;

    /// Close the connection pool.
    async fn close(&self);
}

/// Maps a logical connection id to connection parameters.
///
/// Passed explicitly into the orchestrator; a failure here is fatal for
/// the run because nothing can be validated without both connections.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Resolve connection parameters for a connection id.
    async fn resolve(&self, connection_id: &str) -> Result<ConnectionParams>;

    /// Get the backend type name for logging.
    fn backend_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_options_default() {
        let opts = SampleOptions::default();
        assert_eq!(opts.limit, 10);
        assert!(opts.order_by.is_empty());
    }

    #[test]
    fn test_sample_options_with_limit() {
        let opts = SampleOptions::with_limit(25);
        assert_eq!(opts.limit, 25);
        assert!(opts.order_by.is_empty());
    }
}
