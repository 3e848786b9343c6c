//! Validation orchestrator - main workflow coordinator.
//!
//! Sanitizes the manifest, resolves credentials, opens both readers, runs
//! the comparison engine and writes the results document.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::compare::{ComparisonEngine, Side};
use crate::config::{Config, ConnectionConfig, CredentialBackend, CredentialsConfig};
use crate::core::{CredentialResolver, TableReader};
use crate::credentials::{StaticResolver, VaultResolver};
use crate::drivers::{Connector, DbKind, DriverConnector};
use crate::error::{Result, ValidateError};
use crate::manifest::sanitize_manifest;
use crate::report::{write_results, LogSink, ValidationSummary};

/// Run status when every row was validated and none failed.
pub const STATUS_COMPLETED: &str = "completed";
/// Run status when at least one row failed.
pub const STATUS_FAILED: &str = "failed";
/// Run status when the manifest had no clean rows.
pub const STATUS_NOTHING_TO_VALIDATE: &str = "nothing_to_validate";

/// Validation orchestrator.
pub struct Orchestrator {
    config: Config,
    resolver: Arc<dyn CredentialResolver>,
    connector: Arc<dyn Connector>,
}

/// Result of a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Clean manifest rows handed to the engine.
    pub manifest_rows: usize,

    /// Manifest records written to the problem report.
    pub problem_rows: usize,

    /// Results document, if it was written.
    pub results_file: Option<PathBuf>,

    /// Per-row verdicts and counts.
    pub summary: ValidationSummary,
}

impl ValidationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Connectivity of one side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideHealth {
    pub conn_id: String,
    /// Database type, once inferred.
    pub db_type: Option<String>,
    pub connected: bool,
    /// Time to resolve credentials and open the pool.
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Result of a health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub source: SideHealth,
    pub target: SideHealth,
    pub healthy: bool,
}

impl HealthCheckResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(config: Config, resolver: Arc<dyn CredentialResolver>) -> Self {
        Self {
            config,
            resolver,
            connector: Arc::new(DriverConnector),
        }
    }

    /// Replace the connector used to open readers.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Create an orchestrator with the resolver the configuration names.
    pub async fn from_config(config: Config) -> Result<Self> {
        let resolver = resolver_from_config(&config.credentials).await?;
        Ok(Self::new(config, resolver))
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the validation.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<ValidationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting validation run: {}", run_id);

        info!("Phase 1: Sanitizing manifest {:?}", self.config.manifest_path);
        let sanitized = sanitize_manifest(&self.config.manifest_path);
        let problem_rows = sanitized.problems.len();

        if sanitized.is_empty() {
            warn!("Manifest has no valid rows, nothing to validate");
            let summary =
                ValidationSummary::from_verdicts(&self.config.project, &self.config.subproject, vec![]);
            return Ok(self.finish(
                run_id,
                STATUS_NOTHING_TO_VALIDATE,
                started_at,
                0,
                problem_rows,
                None,
                summary,
            ));
        }

        if cancel.is_cancelled() {
            return Err(ValidateError::Cancelled);
        }

        info!(
            "Phase 2: Connecting to {} and {}",
            self.config.source.conn_id, self.config.target.conn_id
        );
        let (source, target) = self.open_readers().await?;

        info!("Phase 3: Comparing {} table mappings", sanitized.clean.len());
        let engine = ComparisonEngine::new(source, target, self.config.compare_options());
        let outcome = engine.run(&sanitized.clean, &LogSink, cancel).await;

        if outcome.cancelled {
            warn!(
                "Validation cancelled with {} of {} rows validated",
                outcome.verdicts.len(),
                sanitized.clean.len()
            );
            return Err(ValidateError::Cancelled);
        }

        let summary = ValidationSummary::from_verdicts(
            &self.config.project,
            &self.config.subproject,
            outcome.verdicts,
        );

        info!("Phase 4: Writing results to {:?}", self.config.report_dir);
        let results_file = match write_results(&self.config.report_dir, &summary) {
            Ok(path) => Some(path),
            Err(e) => {
                error!(
                    "Failed to write results to {:?}: {}",
                    self.config.report_dir, e
                );
                None
            }
        };

        let status = if summary.has_failures() {
            STATUS_FAILED
        } else {
            STATUS_COMPLETED
        };

        info!(
            "Validation {}: {} passed, {} failed, {} skipped of {}",
            status, summary.passed, summary.failed, summary.skipped, summary.total
        );

        Ok(self.finish(
            run_id,
            status,
            started_at,
            sanitized.clean.len(),
            problem_rows,
            results_file,
            summary,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        run_id: String,
        status: &str,
        started_at: DateTime<Utc>,
        manifest_rows: usize,
        problem_rows: usize,
        results_file: Option<PathBuf>,
        summary: ValidationSummary,
    ) -> ValidationResult {
        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        ValidationResult {
            run_id,
            status: status.to_string(),
            started_at,
            completed_at,
            duration_seconds,
            manifest_rows,
            problem_rows,
            results_file,
            summary,
        }
    }

    /// Open both readers. If the target cannot be opened the source reader
    /// is closed before the error is returned.
    async fn open_readers(&self) -> Result<(Arc<dyn TableReader>, Arc<dyn TableReader>)> {
        let source = self.open_reader(Side::Source, &self.config.source).await?;

        match self.open_reader(Side::Target, &self.config.target).await {
            Ok(target) => Ok((source, target)),
            Err(e) => {
                source.close().await;
                Err(e)
            }
        }
    }

    async fn open_reader(&self, side: Side, conn: &ConnectionConfig) -> Result<Arc<dyn TableReader>> {
        let kind = DbKind::infer(&conn.conn_id, conn.r#type.as_deref())?;
        let params = self.resolver.resolve(&conn.conn_id).await?;
        info!(
            "{} {}: {} at {} ({} credentials)",
            side,
            conn.conn_id,
            kind,
            params.endpoint(),
            self.resolver.backend_type()
        );

        let settings = match side {
            Side::Source => self.config.source_settings(),
            Side::Target => self.config.target_settings(),
        };
        self.connector.connect(kind, &params, &settings).await
    }

    /// Resolve and connect both sides, reporting status and latency for each.
    pub async fn health_check(&self) -> Result<HealthCheckResult> {
        let source = self.check_side(Side::Source, &self.config.source).await;
        let target = self.check_side(Side::Target, &self.config.target).await;
        let healthy = source.connected && target.connected;

        Ok(HealthCheckResult {
            source,
            target,
            healthy,
        })
    }

    async fn check_side(&self, side: Side, conn: &ConnectionConfig) -> SideHealth {
        let started = Instant::now();
        let db_type = DbKind::infer(&conn.conn_id, conn.r#type.as_deref())
            .ok()
            .map(|k| k.to_string());

        let (connected, error) = match self.open_reader(side, conn).await {
            Ok(reader) => {
                reader.close().await;
                (true, None)
            }
            Err(e) => {
                warn!("{} {} health check failed: {}", side, conn.conn_id, e);
                (false, Some(e.to_string()))
            }
        };

        SideHealth {
            conn_id: conn.conn_id.clone(),
            db_type,
            connected,
            latency_ms: started.elapsed().as_millis() as u64,
            error,
        }
    }
}

/// Build the credential resolver the configuration names.
///
/// The Vault backend reads its token from the configured environment
/// variable and verifies it before returning.
pub async fn resolver_from_config(config: &CredentialsConfig) -> Result<Arc<dyn CredentialResolver>> {
    match config.backend {
        CredentialBackend::File => {
            let path = config.file.as_ref().ok_or_else(|| {
                ValidateError::Config("credentials.file is required for the file backend".into())
            })?;
            info!("Loading credentials from {:?}", path);
            Ok(Arc::new(StaticResolver::load(path)?))
        }
        CredentialBackend::Vault => {
            let token = std::env::var(&config.vault.token_env)
                .ok()
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| {
                    ValidateError::credential(
                        "vault",
                        format!("environment variable {} is not set", config.vault.token_env),
                    )
                })?;
            let resolver =
                VaultResolver::connect(config.vault.resolved_addr(), &config.vault.mount, token)
                    .await?;
            Ok(Arc::new(resolver))
        }
    }
}
