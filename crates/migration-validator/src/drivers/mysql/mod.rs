//! MySQL/MariaDB driver.
//!
//! - [`MysqlDialect`]: SQL syntax strategy
//! - [`MysqlReader`]: pooled table reader
//!
//! # Feature Flag
//!
//! Only available with the `mysql` feature (on by default):
//!
//! ```toml
//! [dependencies]
//! migration-validator = { version = "0.1", features = ["mysql"] }
//! ```
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+

mod dialect;
mod reader;

pub use dialect::MysqlDialect;
pub use reader::MysqlReader;
