//! PostgreSQL and Greenplum driver.
//!
//! - [`PostgresDialect`]: SQL syntax strategy
//! - [`PostgresReader`]: pooled table reader

mod dialect;
mod reader;

pub use dialect::PostgresDialect;
pub use reader::PostgresReader;
