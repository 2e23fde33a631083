//! Error types for the payment routing pipeline
//!
//! This module defines all error types that can occur during a pipeline run.
//! Errors are designed to be descriptive and user-friendly for CLI output.
//!
//! # Error Categories
//!
//! - **Fatal errors**: File not found, I/O failures, store unavailability,
//!   sink write failures. These abort the run before or during processing.
//! - **Row-level errors**: Malformed input fields, ranking service failures,
//!   unknown currency codes. These are caught at the row boundary and either
//!   skipped or escalated depending on the configured failure policy.

use thiserror::Error;

/// Main error type for the payment routing pipeline
///
/// Each variant includes enough context to identify the offending row or
/// collaborator. Use [`PipelineError::is_fatal`] to distinguish errors that
/// must abort the run from errors that are subject to the per-row policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A required input file does not exist
    ///
    /// This is a fatal error that prevents processing from starting.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading input or writing output
    ///
    /// This is a fatal error (file permissions, disk full, etc.).
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// A source row could not be parsed into a domain record
    ///
    /// Covers malformed numeric fields, unparseable timestamps and
    /// structurally invalid CSV rows. This is a row-level error.
    #[error("Malformed input{}: {message}", row.map(|r| format!(" at row {}", r)).unwrap_or_default())]
    MalformedInput {
        /// Input row number where the error occurred (if known)
        row: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// The rate table has no entry for a payment's currency code
    ///
    /// This is a row-level error. It must never be silently treated as a
    /// zero conversion rate, as that would corrupt the profit aggregates.
    #[error("Unknown currency code '{code}'")]
    UnknownCurrency {
        /// The currency code missing from the rate table
        code: String,
    },

    /// The ranking service call failed
    ///
    /// Covers network errors, timeouts, non-success status codes and
    /// malformed response bodies. This is a row-level error; it is never
    /// treated as an empty ranked set.
    #[error("Ranking service failure: {message}")]
    RankingServiceFailure {
        /// Description of the failure
        message: String,
    },

    /// The provider store could not be reached or a query failed
    ///
    /// This is a fatal error; it aborts the run regardless of policy.
    #[error("Provider store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the store failure
        message: String,
    },

    /// Writing a completed row to the output sink failed
    ///
    /// This is a fatal error; a partial output file is left behind.
    #[error("Sink write failure: {message}")]
    SinkWriteFailure {
        /// Description of the write failure
        message: String,
    },
}

impl PipelineError {
    /// Whether this error must abort the whole run
    ///
    /// Fatal errors bypass the configured failure policy and trigger the
    /// scoped shutdown sequence (truncate store, flush sink, non-zero exit).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::FileNotFound { .. }
                | PipelineError::Io { .. }
                | PipelineError::StoreUnavailable { .. }
                | PipelineError::SinkWriteFailure { .. }
        )
    }

    /// Create a MalformedInput error with a known row number
    pub fn malformed(row: u64, message: impl Into<String>) -> Self {
        PipelineError::MalformedInput {
            row: Some(row),
            message: message.into(),
        }
    }

    /// Create an UnknownCurrency error
    pub fn unknown_currency(code: impl Into<String>) -> Self {
        PipelineError::UnknownCurrency { code: code.into() }
    }

    /// Create a RankingServiceFailure error
    pub fn ranking_failure(message: impl Into<String>) -> Self {
        PipelineError::RankingServiceFailure {
            message: message.into(),
        }
    }

    /// Create a StoreUnavailable error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        PipelineError::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Create a SinkWriteFailure error
    pub fn sink_failure(message: impl Into<String>) -> Self {
        PipelineError::SinkWriteFailure {
            message: message.into(),
        }
    }
}

// Conversion from io::Error to PipelineError
impl From<std::io::Error> for PipelineError {
    fn from(error: std::io::Error) -> Self {
        PipelineError::Io {
            message: error.to_string(),
        }
    }
}

/// Translate a physical CSV file line into a 1-based data row number
///
/// The header occupies line 1, so data row N sits on physical line N + 1.
/// Lines that cannot map to a data row (the header itself, or a zero
/// position) yield `None`.
fn data_row_from_line(line: u64) -> Option<u64> {
    line.checked_sub(1).filter(|row| *row > 0)
}

// Conversion from csv::Error to PipelineError
impl From<csv::Error> for PipelineError {
    fn from(error: csv::Error) -> Self {
        let row = error
            .position()
            .map(|pos| pos.line())
            .and_then(data_row_from_line);

        PipelineError::MalformedInput {
            row,
            message: error.to_string(),
        }
    }
}

// Conversion from csv_async::Error to PipelineError
impl From<csv_async::Error> for PipelineError {
    fn from(error: csv_async::Error) -> Self {
        let row = error
            .position()
            .map(|pos| pos.line())
            .and_then(data_row_from_line);

        PipelineError::MalformedInput {
            row,
            message: error.to_string(),
        }
    }
}
