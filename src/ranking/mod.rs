//! Ranking service boundary
//!
//! The ranking service is an external collaborator that reorders and filters
//! a payment's eligible providers by predicted conversion likelihood. The
//! exchange is a single request/response round trip per payment:
//!
//! - request: JSON array of provider candidates
//!   `{id, conversion, avg_time, commission, limit_min, limit_max}`
//! - response: `{"filteredData": [...], "executionTime": <ms>}`
//!
//! The returned latency is the service's self-reported processing time and
//! feeds the run statistics only; it has no effect on correctness.
//!
//! Callers must skip the call entirely when the eligible set is empty;
//! an empty candidate list is a pipeline bug, not a service concern.

use crate::types::{PipelineError, ProviderId, ProviderRateCard, RankedProvider};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

pub mod http;
pub mod mock;

pub use http::{HttpRankingClient, RankingClientConfig};
pub use mock::{MockBehavior, MockRankingService};

/// One provider candidate in the ranking request
///
/// Field names follow the service's wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCandidate {
    pub id: ProviderId,
    pub conversion: f64,
    pub avg_time: f64,
    pub commission: f64,
    pub limit_min: f64,
    pub limit_max: f64,
}

impl From<&ProviderRateCard> for ProviderCandidate {
    fn from(card: &ProviderRateCard) -> Self {
        Self {
            id: card.provider_id,
            conversion: card.conversion_rate,
            avg_time: card.avg_processing_time,
            commission: card.commission,
            limit_min: card.limit_min.to_f64().unwrap_or(0.0),
            limit_max: card.limit_max.to_f64().unwrap_or(0.0),
        }
    }
}

/// Deserialized ranking service response body
#[derive(Debug, Clone, Deserialize)]
pub struct RankingResponse {
    /// Ordered, filtered provider summaries
    #[serde(rename = "filteredData")]
    pub filtered_data: Vec<RankedProvider>,

    /// Service-side processing time in milliseconds
    #[serde(rename = "executionTime")]
    pub execution_time_ms: f64,
}

/// Result of one ranking round trip
#[derive(Debug, Clone, PartialEq)]
pub struct RankingOutcome {
    /// Providers in ranked order, possibly a strict subset of the candidates
    pub ranked: Vec<RankedProvider>,

    /// The service's self-reported processing latency in milliseconds
    pub latency_ms: f64,
}

/// Boundary to the external ranking/filtering service
#[async_trait]
pub trait RankingService: Send + Sync {
    /// Rank a non-empty candidate set for one payment
    ///
    /// Network failure, timeout, non-success status and malformed response
    /// body all surface as `RankingServiceFailure`. A failure is never
    /// collapsed into an empty ranked set, because that would silently
    /// corrupt the profit statistics.
    async fn rank(
        &self,
        candidates: &[ProviderCandidate],
    ) -> Result<RankingOutcome, PipelineError>;
}
