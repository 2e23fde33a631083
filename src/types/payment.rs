//! Payment-related types for the routing pipeline
//!
//! A payment enters the pipeline as a raw CSV row, is parsed into a
//! [`PaymentRecord`], and leaves as an enriched output row carrying the
//! ranked provider priority string and (optionally) an expected profit.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// A single payment parsed from the source CSV
///
/// Immutable once parsed. Created per input row, consumed once by the
/// pipeline, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    /// When the payment event occurred
    pub event_time: NaiveDateTime,

    /// Payment amount in the payment's own currency
    pub amount: Decimal,

    /// ISO-style currency code (e.g. "USD", "EUR")
    pub currency: String,

    /// Payment method label carried through to the output unchanged
    pub payment_method: String,

    /// Opaque card token carried through to the output unchanged
    pub card_token: String,
}

/// Aggregate statistics for a whole pipeline run
///
/// Owned by the pipeline runner and mutated exactly once per drained row,
/// in the single-threaded drain loop, so no update can be lost regardless
/// of how many rows are in flight. Read once at the end of the run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunStatistics {
    /// Total rows pulled from the source, including failed ones
    pub rows_read: u64,

    /// Rows that produced an output record
    pub rows_succeeded: u64,

    /// Rows dropped (skip policy) or the row that aborted the run
    pub rows_failed: u64,

    /// Number of ranking service round trips issued
    pub ranking_calls: u64,

    /// Sum of the ranking service's self-reported latencies, in milliseconds
    pub latency_ms_total: f64,

    /// Sum of expected profit across all completed rows, in USD
    pub profit_usd_total: f64,
}

impl RunStatistics {
    /// Record a row that completed successfully
    ///
    /// `latency_ms` is present only when a ranking call was actually issued
    /// for the row; rows with no eligible providers skip the call entirely.
    pub fn record_success(&mut self, latency_ms: Option<f64>, profit_usd: f64) {
        self.rows_read += 1;
        self.rows_succeeded += 1;
        if let Some(latency) = latency_ms {
            self.ranking_calls += 1;
            self.latency_ms_total += latency;
        }
        self.profit_usd_total += profit_usd;
    }

    /// Record a row that failed at some pipeline stage
    pub fn record_failure(&mut self) {
        self.rows_read += 1;
        self.rows_failed += 1;
    }

    /// Average ranking service latency across all issued calls
    ///
    /// Returns 0.0 when no ranking call was made during the run.
    pub fn avg_latency_ms(&self) -> f64 {
        if self.ranking_calls == 0 {
            0.0
        } else {
            self.latency_ms_total / self.ranking_calls as f64
        }
    }
}
