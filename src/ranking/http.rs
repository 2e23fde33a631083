//! HTTP client for the ranking service

use crate::ranking::{ProviderCandidate, RankingOutcome, RankingResponse, RankingService};
use crate::types::PipelineError;
use async_trait::async_trait;
use std::time::Duration;

/// Timeout and retry policy for the ranking client
///
/// The policy is explicit so a slow or dead service cannot hang the whole
/// batch: every request carries `timeout`, and a failed request is retried
/// at most `retries` additional times before the row is failed.
#[derive(Debug, Clone)]
pub struct RankingClientConfig {
    /// Per-request timeout
    pub timeout: Duration,

    /// Number of additional attempts after a failed request
    pub retries: u32,
}

impl Default for RankingClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            retries: 0,
        }
    }
}

/// Ranking service client over HTTP
///
/// Issues a single `POST {base_url}/ai_filtered_data` per payment with the
/// candidate list as the JSON body.
pub struct HttpRankingClient {
    client: reqwest::Client,
    endpoint: String,
    config: RankingClientConfig,
}

impl HttpRankingClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, config: RankingClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/ai_filtered_data", base_url.trim_end_matches('/')),
            config,
        }
    }

    async fn attempt(
        &self,
        candidates: &[ProviderCandidate],
    ) -> Result<RankingOutcome, PipelineError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(candidates)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PipelineError::ranking_failure(format!(
                        "request timed out after {:?}",
                        self.config.timeout
                    ))
                } else {
                    PipelineError::ranking_failure(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::ranking_failure(format!(
                "unexpected status {}",
                status
            )));
        }

        let body: RankingResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::ranking_failure(format!("malformed response: {}", e)))?;

        Ok(RankingOutcome {
            ranked: body.filtered_data,
            latency_ms: body.execution_time_ms,
        })
    }
}

#[async_trait]
impl RankingService for HttpRankingClient {
    async fn rank(
        &self,
        candidates: &[ProviderCandidate],
    ) -> Result<RankingOutcome, PipelineError> {
        let mut last_error = None;

        for _ in 0..=self.config.retries {
            match self.attempt(candidates).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| PipelineError::ranking_failure("no attempts were made")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_construction() {
        let client = HttpRankingClient::new("http://localhost:3000", RankingClientConfig::default());
        assert_eq!(client.endpoint, "http://localhost:3000/ai_filtered_data");

        let client = HttpRankingClient::new("http://localhost:3000/", RankingClientConfig::default());
        assert_eq!(client.endpoint, "http://localhost:3000/ai_filtered_data");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_ranking_failure() {
        // Port 9 (discard) is expected to refuse connections immediately.
        let client = HttpRankingClient::new(
            "http://127.0.0.1:9",
            RankingClientConfig {
                timeout: Duration::from_millis(200),
                retries: 1,
            },
        );

        let candidates = [ProviderCandidate {
            id: 1,
            conversion: 0.8,
            avg_time: 12.0,
            commission: 0.1,
            limit_min: 5.0,
            limit_max: 500.0,
        }];

        let err = client.rank(&candidates).await.unwrap_err();
        assert!(matches!(err, PipelineError::RankingServiceFailure { .. }));
        assert!(!err.is_fatal());
    }
}
