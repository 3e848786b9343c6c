//! Static credential backend backed by a YAML map.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use super::ConnectionParams;
use crate::core::CredentialResolver;
use crate::error::{Result, ValidateError};

/// Resolves connection ids from a fixed map.
///
/// The file format is a YAML mapping from connection id to parameters:
///
/// ```yaml
/// legacy_mysql:
///   servername: mysql.internal
///   database: sales
///   port: 3306
///   username: reader
///   password: secret
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, ConnectionParams>,
}

impl StaticResolver {
    /// Build a resolver from an in-memory map.
    pub fn new(entries: HashMap<String, ConnectionParams>) -> Self {
        Self { entries }
    }

    /// Load a resolver from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a resolver from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let entries: HashMap<String, ConnectionParams> = serde_yaml::from_str(yaml)?;
        for (id, params) in &entries {
            params.validate(id)?;
        }
        Ok(Self { entries })
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, connection_id: impl Into<String>, params: ConnectionParams) {
        self.entries.insert(connection_id.into(), params);
    }
}

#[async_trait]
impl CredentialResolver for StaticResolver {
    async fn resolve(&self, connection_id: &str) -> Result<ConnectionParams> {
        self.entries
            .get(connection_id)
            .cloned()
            .ok_or_else(|| ValidateError::credential(connection_id, "no credentials configured"))
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
legacy_mysql:
  servername: mysql.internal
  database: sales
  port: 3306
  username: reader
  password: secret
warehouse_gpsql:
  servername: gp.internal
  database: dw
  port: "5432"
  username: reader
  password: secret
"#;

    #[tokio::test]
    async fn test_resolve_known_and_unknown() {
        let resolver = StaticResolver::from_yaml(YAML).unwrap();

        let params = resolver.resolve("warehouse_gpsql").await.unwrap();
        assert_eq!(params.port, 5432);
        assert_eq!(params.database, "dw");

        let err = resolver.resolve("nope_mysql").await.unwrap_err();
        assert!(matches!(err, ValidateError::Credential { .. }));
    }

    #[test]
    fn test_from_yaml_rejects_incomplete_entry() {
        let yaml = "src_mysql:\n  servername: ''\n  database: d\n  port: 1\n  username: u\n  password: p\n";
        assert!(StaticResolver::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.yaml");
        std::fs::write(&path, YAML).unwrap();
        assert!(StaticResolver::load(&path).is_ok());
        assert!(StaticResolver::load(dir.path().join("missing.yaml")).is_err());
    }

    #[tokio::test]
    async fn test_insert() {
        let mut resolver = StaticResolver::default();
        resolver.insert(
            "a_pg",
            ConnectionParams {
                servername: "h".into(),
                database: "d".into(),
                port: 5432,
                username: "u".into(),
                password: "p".into(),
            },
        );
        assert!(resolver.resolve("a_pg").await.is_ok());
        assert_eq!(resolver.backend_type(), "file");
    }
}
