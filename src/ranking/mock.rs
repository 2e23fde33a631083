//! Mock ranking service for tests
//!
//! Trait-level stand-in for the external service, so pipeline behavior can
//! be tested without a network. Behaviors cover the interesting shapes of a
//! real response: echo everything back, keep only the top of the list, or
//! fail the call.

use crate::ranking::{ProviderCandidate, RankingOutcome, RankingService};
use crate::types::{PipelineError, RankedProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What the mock does with a candidate set
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return every candidate unchanged, in request order
    Echo,

    /// Return only the first N candidates
    TakeTop(usize),

    /// Fail every call with the given message
    Fail(String),
}

/// Configurable in-process ranking service
pub struct MockRankingService {
    behavior: MockBehavior,
    latency_ms: f64,
    /// Optional real delay consumed per call, for exercising out-of-order
    /// completion in pipeline tests.
    delays: Mutex<VecDeque<u64>>,
    calls: AtomicU64,
}

impl MockRankingService {
    /// Create a mock with the given behavior and a fixed reported latency
    pub fn new(behavior: MockBehavior, latency_ms: f64) -> Self {
        Self {
            behavior,
            latency_ms,
            delays: Mutex::new(VecDeque::new()),
            calls: AtomicU64::new(0),
        }
    }

    /// Echoing mock with a fixed reported latency
    pub fn echo(latency_ms: f64) -> Self {
        Self::new(MockBehavior::Echo, latency_ms)
    }

    /// Add per-call wall-clock delays, consumed in call order
    ///
    /// Calls beyond the schedule complete immediately.
    pub fn with_delays(self, delays_ms: impl IntoIterator<Item = u64>) -> Self {
        {
            let mut queue = self.delays.lock().unwrap();
            queue.extend(delays_ms);
        }
        self
    }

    /// Number of rank calls issued so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn echo_candidates(candidates: &[ProviderCandidate]) -> Vec<RankedProvider> {
        candidates
            .iter()
            .map(|c| RankedProvider {
                id: c.id,
                conversion: c.conversion,
                avg_processing_time: c.avg_time,
                commission: c.commission,
            })
            .collect()
    }
}

#[async_trait]
impl RankingService for MockRankingService {
    async fn rank(
        &self,
        candidates: &[ProviderCandidate],
    ) -> Result<RankingOutcome, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(ms) = delay {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        let ranked = match &self.behavior {
            MockBehavior::Echo => Self::echo_candidates(candidates),
            MockBehavior::TakeTop(n) => {
                let mut ranked = Self::echo_candidates(candidates);
                ranked.truncate(*n);
                ranked
            }
            MockBehavior::Fail(message) => {
                return Err(PipelineError::ranking_failure(message.clone()))
            }
        };

        Ok(RankingOutcome {
            ranked,
            latency_ms: self.latency_ms,
        })
    }
}
