//! Core abstractions for database-agnostic validation.
//!
//! - [`table`]: table identity on one side of a mapping
//! - [`value`]: typed cell values and sample sets
//! - [`traits`]: the reader and credential seams the engine is written against
//!
//! Driver modules (`drivers/postgres`, `drivers/mysql`, `drivers/mssql`)
//! implement [`TableReader`]; credential backends implement
//! [`CredentialResolver`].

pub mod table;
pub mod traits;
pub mod value;

pub use table::TableHandle;
pub use traits::{CredentialResolver, Dialect, SampleOptions, TableReader, DEFAULT_SAMPLE_LIMIT};
pub use value::{SampleSet, SqlNullType, SqlValue};
