//! Database driver implementations.
//!
//! Each driver provides a [`Dialect`](crate::core::Dialect) for its SQL
//! syntax and a [`TableReader`] over its own connection pool:
//!
//! - [`postgres`]: PostgreSQL and Greenplum
//! - [`mysql`]: MySQL/MariaDB (feature `mysql`)
//! - [`mssql`]: Microsoft SQL Server
//! - [`common`]: TLS helpers
//!
//! [`connect`] picks the driver for a [`DbKind`] and returns it behind a
//! trait object, so the comparison engine never sees a concrete driver.

pub mod common;
pub mod mssql;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod postgres;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::TableReader;
use crate::credentials::ConnectionParams;
use crate::error::{Result, ValidateError};

pub use common::{SslMode, TlsBuilder};
pub use mssql::{MssqlDialect, MssqlReader};
#[cfg(feature = "mysql")]
pub use mysql::{MysqlDialect, MysqlReader};
pub use postgres::{PostgresDialect, PostgresReader};

/// Database engine behind a connection id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbKind {
    Postgres,
    Mysql,
    Mssql,
}

impl DbKind {
    /// Parse an engine name.
    pub fn parse(db_type: &str) -> Result<Self> {
        match db_type.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" | "gpsql" | "greenplum" => Ok(DbKind::Postgres),
            "mysql" | "mariadb" => Ok(DbKind::Mysql),
            "mssql" | "sqlserver" | "sql_server" => Ok(DbKind::Mssql),
            other => Err(ValidateError::Config(format!(
                "Unknown database type: '{}'. Supported types: postgres, mysql, mssql",
                other
            ))),
        }
    }

    /// Determine the engine for a connection id.
    ///
    /// An explicit type wins. Otherwise the id's suffix decides:
    /// `_mysql`, `_gpsql`/`_pg`/`_postgres` or `_mssql`.
    pub fn infer(connection_id: &str, explicit: Option<&str>) -> Result<Self> {
        if let Some(db_type) = explicit {
            return Self::parse(db_type);
        }

        let id = connection_id.to_lowercase();
        if id.ends_with("_mysql") {
            Ok(DbKind::Mysql)
        } else if id.ends_with("_gpsql") || id.ends_with("_pg") || id.ends_with("_postgres") {
            Ok(DbKind::Postgres)
        } else if id.ends_with("_mssql") {
            Ok(DbKind::Mssql)
        } else {
            Err(ValidateError::Config(format!(
                "Unsupported connection type for '{}': set an explicit type or use a \
                 _mysql, _gpsql or _mssql suffix",
                connection_id
            )))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DbKind::Postgres => "postgres",
            DbKind::Mysql => "mysql",
            DbKind::Mssql => "mssql",
        }
    }
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings that don't come from the credential store.
#[derive(Debug, Clone)]
pub struct ReaderSettings {
    /// TLS mode for PostgreSQL connections.
    pub ssl_mode: SslMode,
    /// Accept any MSSQL server certificate.
    pub trust_server_cert: bool,
    /// Maximum pooled connections.
    pub max_connections: usize,
    /// Timeout for acquiring or opening a connection.
    pub connect_timeout: Duration,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            ssl_mode: SslMode::Disable,
            trust_server_cert: false,
            max_connections: 4,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Open a reader for the given engine and verify it with a trivial query.
pub async fn connect(
    kind: DbKind,
    params: &ConnectionParams,
    settings: &ReaderSettings,
) -> Result<Arc<dyn TableReader>> {
    match kind {
        DbKind::Postgres => Ok(Arc::new(PostgresReader::connect(params, settings).await?)),
        #[cfg(feature = "mysql")]
        DbKind::Mysql => Ok(Arc::new(MysqlReader::connect(params, settings).await?)),
        #[cfg(not(feature = "mysql"))]
        DbKind::Mysql => Err(ValidateError::Config(
            "MySQL support requires the 'mysql' feature".into(),
        )),
        DbKind::Mssql => Ok(Arc::new(MssqlReader::connect(params, settings).await?)),
    }
}

/// Opens a reader for resolved connection parameters.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        kind: DbKind,
        params: &ConnectionParams,
        settings: &ReaderSettings,
    ) -> Result<Arc<dyn TableReader>>;
}

/// [`Connector`] backed by the built-in drivers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverConnector;

#[async_trait]
impl Connector for DriverConnector {
    async fn connect(
        &self,
        kind: DbKind,
        params: &ConnectionParams,
        settings: &ReaderSettings,
    ) -> Result<Arc<dyn TableReader>> {
        connect(kind, params, settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_from_suffix() {
        assert_eq!(DbKind::infer("legacy_mysql", None).unwrap(), DbKind::Mysql);
        assert_eq!(DbKind::infer("warehouse_gpsql", None).unwrap(), DbKind::Postgres);
        assert_eq!(DbKind::infer("analytics_PG", None).unwrap(), DbKind::Postgres);
        assert_eq!(DbKind::infer("erp_mssql", None).unwrap(), DbKind::Mssql);
    }

    #[test]
    fn test_infer_explicit_type_wins() {
        assert_eq!(
            DbKind::infer("legacy_mysql", Some("postgres")).unwrap(),
            DbKind::Postgres
        );
        assert_eq!(DbKind::infer("whatever", Some("sqlserver")).unwrap(), DbKind::Mssql);
    }

    #[test]
    fn test_infer_unsupported() {
        let err = DbKind::infer("legacy_oracle", None).unwrap_err();
        assert!(matches!(err, ValidateError::Config(_)));
        assert!(err.to_string().contains("Unsupported connection type"));
        assert!(DbKind::infer("x", Some("oracle")).is_err());
    }

    #[test]
    fn test_db_kind_display() {
        assert_eq!(DbKind::Postgres.to_string(), "postgres");
        assert_eq!(DbKind::parse("MariaDB").unwrap().as_str(), "mysql");
    }
}
