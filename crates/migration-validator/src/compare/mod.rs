//! Comparison engine.
//!
//! For every clean manifest row the engine runs the same funnel against
//! both databases:
//!
//! 1. count both tables; a failure or an empty table skips the row
//! 2. unequal counts fail the row without sampling
//! 3. sample both tables; a failure or an empty sample skips the row
//! 4. compare the key columns of the samples positionally
//!
//! Every row yields exactly one [`Verdict`]. Reader errors are turned into
//! verdicts and never affect other rows.

mod columns;
mod types;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::{SampleOptions, TableReader, DEFAULT_SAMPLE_LIMIT};
use crate::error::{Result, ValidateError};
use crate::manifest::MappingRow;
use crate::report::VerdictSink;

pub use columns::compare_key_columns;
pub use types::{
    ColumnMismatch, FetchStage, Outcome, RowIdentity, RunOutcome, Side, Status, ValueMismatch,
    Verdict, MAX_REPORTED_MISMATCHES,
};

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Rows fetched per sample.
    pub sample_limit: usize,
    /// Upper bound for each count or sample query.
    pub query_timeout: Duration,
    /// Rows validated concurrently. 1 means strictly sequential.
    pub workers: usize,
    /// Order samples by the key columns.
    pub order_by_key_columns: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            query_timeout: Duration::from_secs(60),
            workers: 1,
            order_by_key_columns: false,
        }
    }
}

/// Validates manifest rows against a source and a target reader.
///
/// The engine owns both readers for one run. [`run`](Self::run) consumes
/// the engine and closes them before returning.
pub struct ComparisonEngine {
    source: Arc<dyn TableReader>,
    target: Arc<dyn TableReader>,
    options: CompareOptions,
}

impl ComparisonEngine {
    pub fn new(
        source: Arc<dyn TableReader>,
        target: Arc<dyn TableReader>,
        options: CompareOptions,
    ) -> Self {
        Self {
            source,
            target,
            options,
        }
    }

    /// Validate every row, emitting verdicts to `sink` in manifest order.
    ///
    /// Cancellation stops scheduling new rows and abandons rows in flight;
    /// verdicts already emitted are kept. Both readers are closed before
    /// returning.
    pub async fn run(
        self,
        manifest: &[MappingRow],
        sink: &dyn VerdictSink,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let workers = self.options.workers.max(1);
        info!(
            "Validating {} table mappings ({} worker{})",
            manifest.len(),
            workers,
            if workers == 1 { "" } else { "s" }
        );

        let engine = &self;
        let mut outcome = RunOutcome::default();
        {
            let rows = futures::stream::iter(manifest)
                .map(|row| async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    tokio::select! {
                        verdict = engine.compare_row(row) => Some(verdict),
                        _ = cancel.cancelled() => None,
                    }
                })
                .buffered(workers);
            futures::pin_mut!(rows);

            while let Some(result) = rows.next().await {
                match result {
                    Some(verdict) => {
                        sink.emit(&verdict);
                        outcome.verdicts.push(verdict);
                    }
                    None => {
                        outcome.cancelled = true;
                        break;
                    }
                }
            }
        }

        if outcome.cancelled {
            info!(
                "Validation cancelled after {} of {} rows",
                outcome.verdicts.len(),
                manifest.len()
            );
        }

        self.close().await;
        outcome
    }

    async fn close(&self) {
        self.source.close().await;
        self.target.close().await;
    }

    /// Validate a single row.
    pub async fn compare_row(&self, row: &MappingRow) -> Verdict {
        let started = Instant::now();
        let outcome = self.evaluate(row).await;
        debug!(
            "line {}: {} in {:?}",
            row.line,
            outcome.name(),
            started.elapsed()
        );

        Verdict {
            row: RowIdentity::from(row),
            outcome,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn evaluate(&self, row: &MappingRow) -> Outcome {
        let source_table = row.source_handle();
        let target_table = row.target_handle();

        let source_count = match self.timed(self.source.count(&source_table)).await {
            Ok(n) => n,
            Err(e) => return Outcome::fetch_error(FetchStage::Count, Side::Source, e),
        };
        let target_count = match self.timed(self.target.count(&target_table)).await {
            Ok(n) => n,
            Err(e) => return Outcome::fetch_error(FetchStage::Count, Side::Target, e),
        };

        if source_count == 0 || target_count == 0 {
            return Outcome::SkippedEmptyTable {
                source_count,
                target_count,
            };
        }
        if source_count != target_count {
            return Outcome::FailedCountMismatch {
                source_count,
                target_count,
            };
        }

        let opts = SampleOptions {
            limit: self.options.sample_limit,
            order_by: if self.options.order_by_key_columns {
                row.key_columns.clone()
            } else {
                Vec::new()
            },
        };

        let source_sample = match self.timed(self.source.sample(&source_table, &opts)).await {
            Ok(s) if s.is_empty() => {
                return Outcome::fetch_error(FetchStage::Sample, Side::Source, "empty sample")
            }
            Ok(s) => s,
            Err(e) => return Outcome::fetch_error(FetchStage::Sample, Side::Source, e),
        };
        let target_sample = match self.timed(self.target.sample(&target_table, &opts)).await {
            Ok(s) if s.is_empty() => {
                return Outcome::fetch_error(FetchStage::Sample, Side::Target, "empty sample")
            }
            Ok(s) => s,
            Err(e) => return Outcome::fetch_error(FetchStage::Sample, Side::Target, e),
        };

        match compare_key_columns(&source_sample, &target_sample, &row.key_columns) {
            Ok(rows_compared) => Outcome::Passed { rows_compared },
            Err(detail) => Outcome::FailedColumnMismatch { detail },
        }
    }

    async fn timed<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.options.query_timeout, fut)
            .await
            .map_err(|_| ValidateError::Timeout(self.options.query_timeout))?
    }
}
