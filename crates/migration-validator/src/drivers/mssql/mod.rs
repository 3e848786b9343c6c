//! Microsoft SQL Server driver.
//!
//! - [`MssqlDialect`]: SQL syntax strategy
//! - [`MssqlReader`]: table reader over a bb8 pool of Tiberius clients

mod dialect;
mod reader;

pub use dialect::MssqlDialect;
pub use reader::{MssqlReader, TiberiusConnectionManager};
