//! # migration-validator
//!
//! Post-migration validation between relational databases.
//!
//! Given a manifest of source to target table mappings, this library checks
//! that each migrated table arrived intact:
//!
//! - **Manifest sanitizing** with a problem report for duplicate and
//!   incomplete records
//! - **Row count comparison** between source and target
//! - **Sample comparison** of the key columns on a bounded row sample
//! - **Credential resolution** through Vault or a local file
//! - **MySQL, PostgreSQL/Greenplum and MSSQL** readers
//!
//! ## Example
//!
//! ```rust,no_run
//! use migration_validator::{Config, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> migration_validator::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::from_config(config).await?;
//!     let result = orchestrator.run(&CancellationToken::new()).await?;
//!     println!("{} of {} mappings passed", result.summary.passed, result.summary.total);
//!     Ok(())
//! }
//! ```

pub mod compare;
pub mod config;
pub mod core;
pub mod credentials;
pub mod drivers;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod report;

// Re-exports for convenient access
pub use compare::{CompareOptions, ComparisonEngine, Outcome, Status, Verdict};
pub use config::Config;
pub use core::{CredentialResolver, SampleSet, SqlValue, TableHandle, TableReader};
pub use credentials::{ConnectionParams, StaticResolver, VaultResolver};
pub use error::{Result, ValidateError};
pub use manifest::{sanitize_manifest, MappingRow, SanitizeOutcome};
pub use orchestrator::{HealthCheckResult, Orchestrator, ValidationResult};
pub use report::{LogSink, ValidationSummary, VerdictSink};
