//! Streaming row pipeline
//!
//! Orchestrates, for each input row: raw row, domain record, eligibility
//! lookup, ranking call, profit estimate, output row. Rows progress
//! through `Parsed -> Resolved -> Ranked -> Finalized`, with two early exits:
//! an empty eligible set finalizes immediately (empty priority, zero
//! profit, no ranking call), and any collaborator error fails the row.
//!
//! # Ordering and concurrency
//!
//! Row futures are created in input order and driven through
//! `futures::stream::buffered`, which bounds the number of in-flight rows
//! and yields completions in input order regardless of per-row latency.
//! `max_in_flight = 1` degenerates to strict sequential processing, the
//! baseline configuration.
//!
//! # Backpressure
//!
//! The drain loop writes each completed row to the sink before polling the
//! stream again, and the CSV source is only read when the buffer has a free
//! slot, so neither side runs ahead of the other unboundedly.
//!
//! # Statistics
//!
//! The statistics accumulator is owned by `run` and mutated only in the
//! drain loop, once per row, so totals are exact no matter how many rows
//! were in flight concurrently.

use crate::core::{EligibilityResolver, ProfitEstimator};
use crate::io::csv_format::{convert_payment_record, OutputWriter, PaymentCsvRecord};
use crate::io::PaymentReader;
use crate::ranking::{ProviderCandidate, RankingService};
use crate::types::{PipelineError, RunStatistics};
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;

/// What to do with the batch when a row fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the row's cause, exclude it from the output, continue the batch
    Skip,

    /// Halt the stream on the first failed row, leaving the sink partial
    Abort,
}

/// Pipeline tuning knobs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-row failure handling policy
    pub failure_policy: FailurePolicy,

    /// Upper bound on concurrently in-flight rows; 1 means strictly
    /// sequential processing
    pub max_in_flight: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Skip,
            max_in_flight: 1,
        }
    }
}

/// A run halted by a fatal error or an abort-policy row failure
///
/// Carries the statistics accumulated up to and including the halting row,
/// so the caller can still report how far the run got before the failure.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    /// The error that halted the run
    pub error: PipelineError,

    /// Progress made before the halt, including the halting row
    pub stats: RunStatistics,
}

impl From<PipelineError> for RunFailure {
    fn from(error: PipelineError) -> Self {
        Self {
            error,
            stats: RunStatistics::default(),
        }
    }
}

/// Terminal state of one row's progression through the pipeline
///
/// Each row's outcome is an explicit value rather than a nested callback
/// chain, so ordering and failure handling can be reasoned about separately
/// from the concurrency primitive driving the rows.
#[derive(Debug)]
pub enum RowOutcome {
    /// The row reached Finalized and produced an output record
    Completed {
        /// The raw input row, echoed into the output
        raw: PaymentCsvRecord,
        /// Ranked provider ids joined by `-`; empty when none eligible
        providers_priority: String,
        /// Expected profit in USD; None when estimation is disabled
        profit_usd: Option<f64>,
        /// Ranking latency; None when no ranking call was issued
        latency_ms: Option<f64>,
    },

    /// The row failed at some stage and is excluded from the output
    Failed {
        /// 1-based input row number
        row: u64,
        /// The failure cause
        error: PipelineError,
    },
}

/// The streaming row pipeline
pub struct Pipeline {
    resolver: EligibilityResolver,
    ranking: Arc<dyn RankingService>,
    /// Present only when profit estimation is enabled for the run
    estimator: Option<ProfitEstimator>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline over the given collaborators
    ///
    /// Passing `None` for the estimator disables the currency conversion and
    /// profit estimation stage; the output then has no profit column.
    pub fn new(
        resolver: EligibilityResolver,
        ranking: Arc<dyn RankingService>,
        estimator: Option<ProfitEstimator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            resolver,
            ranking,
            estimator,
            config,
        }
    }

    /// Stream payments from `payments` to `sink`, returning run statistics
    ///
    /// Row-level failures are logged to stderr and handled per the
    /// configured policy; fatal errors abort regardless of policy. On abort
    /// the sink is flushed and left partial, and the returned failure still
    /// carries the statistics accumulated before the halt.
    pub async fn run<R, W>(&self, payments: R, sink: W) -> Result<RunStatistics, RunFailure>
    where
        R: AsyncRead + Unpin + Send,
        W: Write,
    {
        let mut writer = OutputWriter::new(sink, self.estimator.is_some())?;
        let mut reader = PaymentReader::new(payments);
        let max_in_flight = self.config.max_in_flight.max(1);

        let mut outcomes = reader
            .records()
            .enumerate()
            .map(|(index, record)| self.process_row(index as u64 + 1, record))
            .buffered(max_in_flight);

        let mut stats = RunStatistics::default();

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                RowOutcome::Completed {
                    raw,
                    providers_priority,
                    profit_usd,
                    latency_ms,
                } => {
                    if let Err(error) = writer.write_row(&raw, &providers_priority, profit_usd) {
                        return Err(RunFailure { error, stats });
                    }
                    stats.record_success(latency_ms, profit_usd.unwrap_or(0.0));
                }
                RowOutcome::Failed { row, error } => {
                    eprintln!("Row {} failed: {}", row, error);
                    stats.record_failure();

                    if error.is_fatal() || self.config.failure_policy == FailurePolicy::Abort {
                        let _ = writer.flush();
                        return Err(RunFailure { error, stats });
                    }
                }
            }
        }
        drop(outcomes);

        if let Err(error) = writer.flush() {
            return Err(RunFailure { error, stats });
        }
        Ok(stats)
    }

    /// Drive one row to its terminal state
    async fn process_row(
        &self,
        row: u64,
        record: Result<PaymentCsvRecord, PipelineError>,
    ) -> RowOutcome {
        let raw = match record {
            Ok(raw) => raw,
            Err(error) => return RowOutcome::Failed { row, error },
        };

        match self.enrich(row, &raw).await {
            Ok((providers_priority, profit_usd, latency_ms)) => RowOutcome::Completed {
                raw,
                providers_priority,
                profit_usd,
                latency_ms,
            },
            Err(error) => RowOutcome::Failed {
                row,
                error: with_row_context(error, row),
            },
        }
    }

    /// Parsed -> Resolved -> Ranked -> Finalized for one row
    async fn enrich(
        &self,
        row: u64,
        raw: &PaymentCsvRecord,
    ) -> Result<(String, Option<f64>, Option<f64>), PipelineError> {
        // Parsed
        let payment = convert_payment_record(raw, row)?;

        // Resolved; an empty eligible set short-circuits to Finalized
        // without a ranking call.
        let eligible = self.resolver.find_eligible(&payment).await?;
        if eligible.is_empty() {
            let profit = self.estimator.as_ref().map(|_| 0.0);
            return Ok((String::new(), profit, None));
        }

        // Ranked
        let candidates: Vec<ProviderCandidate> =
            eligible.iter().map(ProviderCandidate::from).collect();
        let outcome = self.ranking.rank(&candidates).await?;

        let providers_priority = outcome
            .ranked
            .iter()
            .map(|p| p.id.to_string())
            .collect::<Vec<_>>()
            .join("-");

        // Finalized
        let profit_usd = match &self.estimator {
            Some(estimator) => Some(estimator.estimate(&payment, &outcome.ranked)?),
            None => None,
        };

        Ok((providers_priority, profit_usd, Some(outcome.latency_ms)))
    }
}

/// Fill in the row number on errors raised below the row boundary
fn with_row_context(error: PipelineError, row: u64) -> PipelineError {
    match error {
        PipelineError::MalformedInput { row: None, message } => PipelineError::MalformedInput {
            row: Some(row),
            message,
        },
        other => other,
    }
}
