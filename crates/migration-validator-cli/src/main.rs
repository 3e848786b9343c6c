//! migration-validator CLI - post-migration table validation.

use clap::{Parser, Subcommand};
use migration_validator::manifest::{problem_report_path, sanitize_manifest, ProblemReason};
use migration_validator::{Config, Orchestrator, Status, ValidateError, ValidationResult};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "migration-validator")]
#[command(about = "Post-migration row count and sample validation")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Timeout in seconds for graceful shutdown (default: 60)
    #[arg(long, default_value = "60")]
    shutdown_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every table mapping in the manifest
    Run {
        /// Override the manifest path from the config
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Override number of workers
        #[arg(long)]
        workers: Option<usize>,

        /// Override rows fetched per sample
        #[arg(long)]
        sample_limit: Option<usize>,

        /// Exit successfully even if some mappings failed
        #[arg(long)]
        allow_failures: bool,
    },

    /// Sanitize the manifest and write the problem report without connecting
    CheckManifest {
        /// Manifest to check (default: manifest_path from the config)
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), ValidateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    // check-manifest with an explicit path needs no config
    if let Commands::CheckManifest {
        manifest: Some(ref path),
    } = cli.command
    {
        check_manifest(path.clone(), cli.output_json)?;
        return Ok(());
    }

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::CheckManifest { .. } => {
            check_manifest(config.manifest_path.clone(), cli.output_json)?;
        }

        Commands::Run {
            manifest,
            workers,
            sample_limit,
            allow_failures,
        } => {
            // Apply overrides
            if let Some(path) = manifest {
                config.manifest_path = path;
            }
            if let Some(w) = workers {
                config.validation.workers = w;
            }
            if let Some(n) = sample_limit {
                config.validation.sample_limit = n;
            }
            config.validate()?;

            let cancel_token = setup_signal_handler();
            let orchestrator = Orchestrator::from_config(config).await?;

            let result = tokio::select! {
                result = orchestrator.run(&cancel_token) => result?,
                _ = shutdown_deadline(cancel_token.clone(), cli.shutdown_timeout) => {
                    warn!("Shutdown timeout of {}s elapsed, exiting", cli.shutdown_timeout);
                    return Err(ValidateError::Cancelled);
                }
            };

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                print_result(&result);
            }

            if result.summary.has_failures() && !allow_failures {
                return Err(ValidateError::ValidationFailed {
                    failed: result.summary.failed,
                    total: result.summary.total,
                });
            }
        }

        Commands::HealthCheck => {
            let orchestrator = Orchestrator::from_config(config).await?;
            let result = orchestrator.health_check().await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("Health Check Results:");
                for (label, side) in [("Source", &result.source), ("Target", &result.target)] {
                    println!(
                        "  {} {} ({}): {} ({}ms)",
                        label,
                        side.conn_id,
                        side.db_type.as_deref().unwrap_or("unknown"),
                        if side.connected { "OK" } else { "FAILED" },
                        side.latency_ms
                    );
                    if let Some(ref err) = side.error {
                        println!("    Error: {}", err);
                    }
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(ValidateError::connection(
                    "Health check failed",
                    "connecting to source and target",
                ));
            }
        }
    }

    Ok(())
}

fn check_manifest(path: PathBuf, output_json: bool) -> Result<(), ValidateError> {
    let outcome = sanitize_manifest(&path);
    let duplicates = outcome.count(ProblemReason::Duplicate);
    let missing = outcome.count(ProblemReason::MissingValue);

    if output_json {
        let doc = serde_json::json!({
            "manifest": path,
            "clean": outcome.clean.len(),
            "duplicate": duplicates,
            "missing_value": missing,
            "problem_report": problem_report_path(&path),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("Manifest: {}", path.display());
        println!("  Clean rows: {}", outcome.clean.len());
        println!("  Duplicate records: {}", duplicates);
        println!("  Invalid records: {}", missing);
        if outcome.is_empty() {
            println!("  Nothing to validate");
        }
    }

    Ok(())
}

fn print_result(result: &ValidationResult) {
    let summary = &result.summary;
    println!("\nValidation {}", result.status);
    println!("  Run ID: {}", result.run_id);
    println!("  Duration: {:.2}s", result.duration_seconds);
    println!(
        "  Mappings: {} passed, {} failed, {} skipped of {}",
        summary.passed, summary.failed, summary.skipped, summary.total
    );
    if result.problem_rows > 0 {
        println!("  Manifest problems: {}", result.problem_rows);
    }
    for verdict in summary.with_status(Status::Fail) {
        println!("  FAIL {}: {}", verdict.row, verdict.outcome);
    }
    if let Some(ref path) = result.results_file {
        println!("  Results: {}", path.display());
    }
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Resolves once `shutdown_timeout` seconds have passed after cancellation.
async fn shutdown_deadline(cancel: CancellationToken, shutdown_timeout: u64) {
    cancel.cancelled().await;
    tokio::time::sleep(Duration::from_secs(shutdown_timeout)).await;
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            let mut stream = match signal(kind) {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to install {} handler: {}", name, e);
                    return;
                }
            };
            stream.recv().await;
            eprintln!("\nReceived {}. Shutting down gracefully...", name);
            token.cancel();
        });
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {}", e);
            return;
        }
        eprintln!("\nReceived Ctrl-C. Shutting down gracefully...");
        token.cancel();
    });

    cancel_token
}
