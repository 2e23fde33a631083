//! Eligibility resolution for payments
//!
//! Given a payment, the resolver asks the provider store for every rate card
//! matching the payment's currency, event time and amount, then reduces the
//! result to the latest applicable version per provider. An empty result is
//! the normal "payment cannot be routed" outcome and propagates to the
//! output as an empty priority string, never as an error.

use crate::core::provider_store::ProviderStore;
use crate::types::{PaymentRecord, PipelineError, ProviderId, ProviderRateCard};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves the set of providers eligible for a payment
pub struct EligibilityResolver {
    store: Arc<dyn ProviderStore>,
}

impl EligibilityResolver {
    /// Create a resolver backed by the given provider store
    pub fn new(store: Arc<dyn ProviderStore>) -> Self {
        Self { store }
    }

    /// Find the active rate card per provider for this payment
    ///
    /// Latest-version-as-of-event-time semantics: a provider may have
    /// several historical cards matching the predicate; only the one with
    /// the greatest effective time not later than the payment's event time
    /// is eligible. The store enforces one card per
    /// `(provider_id, effective_time)`, so effective-time ties cannot occur;
    /// if a store implementation ever yields one, the first card encountered
    /// wins. The result is sorted by provider id for deterministic output.
    pub async fn find_eligible(
        &self,
        payment: &PaymentRecord,
    ) -> Result<Vec<ProviderRateCard>, PipelineError> {
        let candidates = self
            .store
            .query_matching(&payment.currency, payment.event_time, payment.amount)
            .await?;

        let mut latest: HashMap<ProviderId, ProviderRateCard> = HashMap::new();
        for card in candidates {
            match latest.get(&card.provider_id) {
                Some(existing) if existing.effective_time >= card.effective_time => {}
                _ => {
                    latest.insert(card.provider_id, card);
                }
            }
        }

        let mut eligible: Vec<ProviderRateCard> = latest.into_values().collect();
        eligible.sort_by_key(|card| card.provider_id);
        Ok(eligible)
    }
}
