//! Row pipeline module
//!
//! The pipeline streams payment rows from source to sink with bounded
//! in-flight concurrency, preserves input order in the output, isolates
//! per-row failures and accumulates run-level statistics.
//!
//! - `runner` - Streaming orchestration over the enrichment collaborators

pub mod runner;

pub use runner::{FailurePolicy, Pipeline, PipelineConfig, RowOutcome, RunFailure};
