//! HashiCorp Vault KV v2 credential backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use super::ConnectionParams;
use crate::core::CredentialResolver;
use crate::error::{Result, ValidateError};

/// Vault address used when neither config nor `VAULT_ADDR` provide one.
pub const DEFAULT_VAULT_ADDR: &str = "http://127.0.0.1:8200";

/// Default KV v2 mount.
pub const DEFAULT_VAULT_MOUNT: &str = "secret";

const TOKEN_HEADER: &str = "X-Vault-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct KvResponse {
    data: KvData,
}

#[derive(Deserialize)]
struct KvData {
    data: serde_json::Value,
}

/// Resolves connection ids from `{mount}/data/{connection_id}`.
pub struct VaultResolver {
    client: reqwest::Client,
    addr: String,
    mount: String,
    token: String,
}

impl VaultResolver {
    /// Build a resolver without contacting Vault.
    pub fn new(
        addr: impl Into<String>,
        mount: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            addr: addr.into().trim_end_matches('/').to_string(),
            mount: mount.into().trim_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Build a resolver and check that the token is accepted.
    pub async fn connect(
        addr: impl Into<String>,
        mount: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let resolver = Self::new(addr, mount, token)?;
        resolver.verify_token().await?;
        info!("Authenticated to Vault at {}", resolver.addr);
        Ok(resolver)
    }

    /// Check the token against `auth/token/lookup-self`.
    pub async fn verify_token(&self) -> Result<()> {
        let url = format!("{}/v1/auth/token/lookup-self", self.addr);
        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| ValidateError::credential("vault", format!("Vault unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValidateError::credential(
                "vault",
                format!("Vault token rejected (status {})", status),
            ));
        }
        Ok(())
    }

    fn secret_url(&self, connection_id: &str) -> String {
        format!("{}/v1/{}/data/{}", self.addr, self.mount, connection_id)
    }
}

/// Extract connection parameters from a KV v2 read response body.
fn parse_secret(connection_id: &str, body: &str) -> Result<ConnectionParams> {
    let response: KvResponse = serde_json::from_str(body).map_err(|e| {
        ValidateError::credential(connection_id, format!("unexpected Vault response: {}", e))
    })?;

    let params: ConnectionParams = serde_json::from_value(response.data.data).map_err(|e| {
        ValidateError::credential(connection_id, format!("incomplete secret: {}", e))
    })?;

    params.validate(connection_id)?;
    Ok(params)
}

#[async_trait]
impl CredentialResolver for VaultResolver {
    async fn resolve(&self, connection_id: &str) -> Result<ConnectionParams> {
        let url = self.secret_url(connection_id);
        debug!("Reading secret for {} from {}", connection_id, url);

        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| ValidateError::credential(connection_id, format!("Vault request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ValidateError::credential(
                connection_id,
                format!("no secret at {}/{}", self.mount, connection_id),
            ));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ValidateError::credential(
                connection_id,
                format!("Vault read failed with status {}: {}", status, text),
            ));
        }

        let body = response.text().await?;
        parse_secret(connection_id, &body)
    }

    fn backend_type(&self) -> &'static str {
        "vault"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_url_normalizes_slashes() {
        let resolver = VaultResolver::new("http://vault:8200/", "/secret/", "t").unwrap();
        assert_eq!(
            resolver.secret_url("legacy_mysql"),
            "http://vault:8200/v1/secret/data/legacy_mysql"
        );
    }

    #[test]
    fn test_parse_secret_kv_v2() {
        let body = r#"{
            "request_id": "abc",
            "data": {
                "data": {
                    "servername": "mysql.internal",
                    "database": "sales",
                    "port": "3306",
                    "username": "reader",
                    "password": "pw"
                },
                "metadata": {"version": 3}
            }
        }"#;

        let params = parse_secret("legacy_mysql", body).unwrap();
        assert_eq!(params.servername, "mysql.internal");
        assert_eq!(params.port, 3306);
    }

    #[test]
    fn test_parse_secret_missing_key() {
        let body = r#"{"data": {"data": {"servername": "h", "database": "d", "port": 1}}}"#;
        let err = parse_secret("wh_gpsql", body).unwrap_err();
        match err {
            ValidateError::Credential { connection_id, message } => {
                assert_eq!(connection_id, "wh_gpsql");
                assert!(message.contains("incomplete secret"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_secret_not_kv_v2() {
        assert!(parse_secret("x", "not json").is_err());
        assert!(parse_secret("x", r#"{"errors": []}"#).is_err());
    }

    #[test]
    fn test_backend_type() {
        let resolver = VaultResolver::new(DEFAULT_VAULT_ADDR, DEFAULT_VAULT_MOUNT, "t").unwrap();
        assert_eq!(resolver.backend_type(), "vault");
    }
}
