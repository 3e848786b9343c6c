//! Configuration type definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compare::CompareOptions;
use crate::credentials::DEFAULT_VAULT_ADDR;
use crate::drivers::common::SslMode;
use crate::drivers::ReaderSettings;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project label, used in the results file name.
    pub project: String,

    /// Subproject label, used in the results file name.
    pub subproject: String,

    /// Source database connection.
    pub source: ConnectionConfig,

    /// Target database connection.
    pub target: ConnectionConfig,

    /// Path to the table mapping CSV.
    pub manifest_path: PathBuf,

    /// Directory the results JSON is written to.
    pub report_dir: PathBuf,

    /// Where connection parameters come from.
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Comparison behavior.
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Config {
    /// Reader settings for the source connection.
    pub fn source_settings(&self) -> ReaderSettings {
        self.reader_settings(&self.source)
    }

    /// Reader settings for the target connection.
    pub fn target_settings(&self) -> ReaderSettings {
        self.reader_settings(&self.target)
    }

    fn reader_settings(&self, conn: &ConnectionConfig) -> ReaderSettings {
        ReaderSettings {
            ssl_mode: conn.ssl_mode,
            trust_server_cert: conn.trust_server_cert,
            max_connections: self.validation.max_connections,
            ..ReaderSettings::default()
        }
    }

    /// Engine options derived from the validation section.
    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            sample_limit: self.validation.sample_limit,
            query_timeout: Duration::from_secs(self.validation.query_timeout_secs),
            workers: self.validation.workers,
            order_by_key_columns: self.validation.order_by_key_columns,
        }
    }
}

/// One side of the comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Logical connection id, resolved through the credential backend.
    pub conn_id: String,

    /// Database type (mysql, postgres, mssql). Inferred from the
    /// `conn_id` suffix when absent.
    #[serde(default)]
    pub r#type: Option<String>,

    /// TLS mode for PostgreSQL (default: disable).
    #[serde(default)]
    pub ssl_mode: SslMode,

    /// Trust the server certificate without validation (MSSQL only).
    #[serde(default)]
    pub trust_server_cert: bool,
}

/// Credential backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// HashiCorp Vault KV v2.
    #[default]
    Vault,
    /// Local YAML file.
    File,
}

/// Credential configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Backend to use (default: vault).
    #[serde(default)]
    pub backend: CredentialBackend,

    /// Vault settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Credentials file, required when `backend` is `file`.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Vault connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault address. Falls back to `VAULT_ADDR`, then the local default.
    #[serde(default)]
    pub addr: Option<String>,

    /// Name of the environment variable holding the token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// KV v2 mount (default: "secret").
    #[serde(default = "default_mount")]
    pub mount: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            addr: None,
            token_env: default_token_env(),
            mount: default_mount(),
        }
    }
}

impl VaultConfig {
    /// Effective Vault address.
    pub fn resolved_addr(&self) -> String {
        self.addr
            .clone()
            .filter(|a| !a.trim().is_empty())
            .or_else(|| std::env::var("VAULT_ADDR").ok().filter(|a| !a.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_VAULT_ADDR.to_string())
    }
}

/// Comparison behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Rows fetched per sample (default: 10).
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,

    /// Per-query timeout in seconds (default: 60).
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Manifest rows validated concurrently (default: 1).
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Order samples by the key columns (default: false).
    #[serde(default)]
    pub order_by_key_columns: bool,

    /// Pool size per database (default: 4).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            sample_limit: default_sample_limit(),
            query_timeout_secs: default_query_timeout_secs(),
            workers: default_workers(),
            order_by_key_columns: false,
            max_connections: default_max_connections(),
        }
    }
}

fn default_token_env() -> String {
    "VAULT_TOKEN".to_string()
}

fn default_mount() -> String {
    crate::credentials::DEFAULT_VAULT_MOUNT.to_string()
}

fn default_sample_limit() -> usize {
    crate::core::DEFAULT_SAMPLE_LIMIT
}

fn default_query_timeout_secs() -> u64 {
    60
}

fn default_workers() -> usize {
    1
}

fn default_max_connections() -> usize {
    4
}
