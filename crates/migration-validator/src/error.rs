//! Error types for the validation library.

use std::time::Duration;

use thiserror::Error;

/// Exit code for configuration errors (invalid YAML, missing fields).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for credential resolution failures.
pub const EXIT_CREDENTIAL_ERROR: u8 = 2;
/// Exit code for connection failures against either database.
pub const EXIT_CONNECTION_ERROR: u8 = 3;
/// Exit code when at least one mapping failed validation.
pub const EXIT_VALIDATION_FAILED: u8 = 4;
/// Exit code for a run interrupted by a signal.
pub const EXIT_CANCELLED: u8 = 5;
/// Exit code for query errors that escaped a row (health check, etc.).
pub const EXIT_QUERY_ERROR: u8 = 6;
/// Exit code for filesystem errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for validation operations.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest could not be parsed (missing header, malformed CSV).
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Credentials for a connection id could not be resolved.
    #[error("Credential error for '{connection_id}': {message}")]
    Credential {
        connection_id: String,
        message: String,
    },

    /// Connection pool error with context
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// A count or sample query failed for a specific table
    #[error("Query failed for table {table}: {message}")]
    Query { table: String, message: String },

    /// A query exceeded the configured timeout
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// MSSQL driver error
    #[error("MSSQL error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    /// PostgreSQL driver error
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// MySQL driver error
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    Mysql(#[from] sqlx::Error),

    /// HTTP error talking to the secret store
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// One or more mappings failed validation
    #[error("Validation failed for {failed} of {total} table mappings")]
    ValidationFailed { failed: usize, total: usize },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation run was cancelled (SIGINT, etc.)
    #[error("Validation cancelled")]
    Cancelled,
}

impl ValidateError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        ValidateError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Credential error
    pub fn credential(connection_id: impl Into<String>, message: impl Into<String>) -> Self {
        ValidateError::Credential {
            connection_id: connection_id.into(),
            message: message.into(),
        }
    }

    /// Create a Query error
    pub fn query(table: impl Into<String>, message: impl ToString) -> Self {
        ValidateError::Query {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ValidateError::Query { .. } | ValidateError::Timeout(_) | ValidateError::Manifest(_)
        )
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ValidateError::Config(_) | ValidateError::Yaml(_) | ValidateError::Manifest(_) => {
                EXIT_CONFIG_ERROR
            }
            ValidateError::Credential { .. } | ValidateError::Http(_) => EXIT_CREDENTIAL_ERROR,
            ValidateError::Connection { .. }
            | ValidateError::Mssql(_)
            | ValidateError::Postgres(_) => EXIT_CONNECTION_ERROR,
            #[cfg(feature = "mysql")]
            ValidateError::Mysql(_) => EXIT_CONNECTION_ERROR,
            ValidateError::ValidationFailed { .. } => EXIT_VALIDATION_FAILED,
            ValidateError::Cancelled => EXIT_CANCELLED,
            ValidateError::Query { .. } | ValidateError::Timeout(_) => EXIT_QUERY_ERROR,
            ValidateError::Io(_) | ValidateError::Csv(_) | ValidateError::Json(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for validation operations.
pub type Result<T> = std::result::Result<T, ValidateError>;
