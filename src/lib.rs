//! Payment Routing Pipeline Library
//! # Overview
//!
//! This library provides a streaming CSV-based enrichment pipeline: for each
//! payment row it resolves the providers eligible to route the payment,
//! forwards them to an external ranking service, estimates the expected
//! profit of the ranked set, and emits an augmented output row.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (PaymentRecord, ProviderRateCard, errors)
//! - [`cli`] - CLI argument parsing
//! - [`core`] - Enrichment components:
//!   - [`core::provider_store`] - Bulk-loaded, time-versioned rate-card store
//!   - [`core::eligibility`] - Latest-version-as-of-event-time resolution
//!   - [`core::rate_table`] - Currency-to-USD conversion factors
//!   - [`core::profit`] - Expected-profit estimation
//! - [`ranking`] - Ranking service boundary (HTTP client and test mock)
//! - [`io`] - CSV input/output handling
//! - [`pipeline`] - Streaming orchestration with bounded concurrency
//!
//! # Processing Model
//!
//! Rows stream from source to sink under bounded memory: each row is parsed,
//! enriched via two asynchronous collaborator calls (store lookup, ranking
//! round trip) and written out, with output order always equal to input
//! order. A failed row is isolated and, depending on the configured policy,
//! either skipped or escalated to abort the batch.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod pipeline;
pub mod ranking;
pub mod types;

pub use crate::core::{
    load_rate_cards, EligibilityResolver, InMemoryProviderStore, ProfitEstimator, ProviderStore,
    RateTable,
};
pub use pipeline::{FailurePolicy, Pipeline, PipelineConfig, RunFailure};
pub use ranking::{HttpRankingClient, RankingClientConfig, RankingService};
pub use types::{
    PaymentRecord, PipelineError, ProviderId, ProviderRateCard, RankedProvider, RunStatistics,
};
