//! Credential resolution.
//!
//! A connection id (e.g. `legacy_mysql`) is resolved to [`ConnectionParams`]
//! by a [`CredentialResolver`](crate::core::CredentialResolver) instance that
//! the caller constructs and passes in:
//!
//! - [`VaultResolver`]: HashiCorp Vault KV v2 over HTTP
//! - [`StaticResolver`]: a YAML file or an in-memory map

mod file;
mod vault;

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::{Result, ValidateError};

pub use file::StaticResolver;
pub use vault::{VaultResolver, DEFAULT_VAULT_ADDR, DEFAULT_VAULT_MOUNT};

/// Everything needed to open a connection to one database.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Host name or address.
    pub servername: String,

    /// Database name.
    pub database: String,

    /// Port. Secret stores often hold it as a string, so both forms are accepted.
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,

    pub username: String,

    pub password: String,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("servername", &self.servername)
            .field("database", &self.database)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl ConnectionParams {
    /// Check that the parameters can be used to connect.
    pub fn validate(&self, connection_id: &str) -> Result<()> {
        if self.servername.trim().is_empty() {
            return Err(ValidateError::credential(connection_id, "servername is empty"));
        }
        if self.database.trim().is_empty() {
            return Err(ValidateError::credential(connection_id, "database is empty"));
        }
        if self.username.trim().is_empty() {
            return Err(ValidateError::credential(connection_id, "username is empty"));
        }
        if self.port == 0 {
            return Err(ValidateError::credential(connection_id, "port must be non-zero"));
        }
        Ok(())
    }

    /// `host:port/database`, for log lines.
    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.servername, self.port, self.database)
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u64),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(n) => u16::try_from(n)
            .map_err(|_| de::Error::custom(format!("port {} is out of range", n))),
        Port::Text(s) => s
            .trim()
            .parse::<u16>()
            .map_err(|_| de::Error::custom(format!("invalid port '{}'", s))),
    }
}
