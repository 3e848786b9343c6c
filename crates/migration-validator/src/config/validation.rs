//! Configuration validation.

use super::{Config, ConnectionConfig, CredentialBackend};
use crate::error::{Result, ValidateError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.project.trim().is_empty() {
        return Err(ValidateError::Config("project is required".into()));
    }
    if config.subproject.trim().is_empty() {
        return Err(ValidateError::Config("subproject is required".into()));
    }

    validate_connection("source", &config.source)?;
    validate_connection("target", &config.target)?;

    if config.source.conn_id == config.target.conn_id {
        return Err(ValidateError::Config(format!(
            "source and target cannot use the same connection id '{}'",
            config.source.conn_id
        )));
    }

    if config.manifest_path.as_os_str().is_empty() {
        return Err(ValidateError::Config("manifest_path is required".into()));
    }
    if config.report_dir.as_os_str().is_empty() {
        return Err(ValidateError::Config("report_dir is required".into()));
    }

    if config.credentials.backend == CredentialBackend::File && config.credentials.file.is_none() {
        return Err(ValidateError::Config(
            "credentials.file is required when credentials.backend is 'file'".into(),
        ));
    }

    let v = &config.validation;
    if v.sample_limit == 0 {
        return Err(ValidateError::Config(
            "validation.sample_limit must be at least 1".into(),
        ));
    }
    if v.query_timeout_secs == 0 {
        return Err(ValidateError::Config(
            "validation.query_timeout_secs must be at least 1".into(),
        ));
    }
    if v.workers == 0 {
        return Err(ValidateError::Config(
            "validation.workers must be at least 1".into(),
        ));
    }
    if v.max_connections == 0 {
        return Err(ValidateError::Config(
            "validation.max_connections must be at least 1".into(),
        ));
    }

    Ok(())
}

fn validate_connection(side: &str, conn: &ConnectionConfig) -> Result<()> {
    if conn.conn_id.trim().is_empty() {
        return Err(ValidateError::Config(format!("{}.conn_id is required", side)));
    }
    crate::drivers::DbKind::infer(&conn.conn_id, conn.r#type.as_deref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CredentialsConfig, ValidationConfig};
    use crate::drivers::common::SslMode;
    use std::path::PathBuf;

    fn connection(conn_id: &str) -> ConnectionConfig {
        ConnectionConfig {
            conn_id: conn_id.to_string(),
            r#type: None,
            ssl_mode: SslMode::Disable,
            trust_server_cert: false,
        }
    }

    fn valid_config() -> Config {
        Config {
            project: "sales".to_string(),
            subproject: "orders".to_string(),
            source: connection("legacy_mysql"),
            target: connection("warehouse_gpsql"),
            manifest_path: PathBuf::from("tables.csv"),
            report_dir: PathBuf::from("reports"),
            credentials: CredentialsConfig::default(),
            validation: ValidationConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_project() {
        let mut config = valid_config();
        config.project = " ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_same_connection_id() {
        let mut config = valid_config();
        config.target.conn_id = "legacy_mysql".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("same connection id"));
    }

    #[test]
    fn test_unknown_connection_suffix() {
        let mut config = valid_config();
        config.source.conn_id = "legacy_oracle".to_string();
        assert!(validate(&config).is_err());

        config.source.r#type = Some("mssql".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_file_backend_requires_file() {
        let mut config = valid_config();
        config.credentials.backend = CredentialBackend::File;
        assert!(validate(&config).is_err());

        config.credentials.file = Some(PathBuf::from("creds.yaml"));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = valid_config();
        config.validation.sample_limit = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.validation.workers = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.validation.query_timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.validation.max_connections = 0;
        assert!(validate(&config).is_err());
    }
}
