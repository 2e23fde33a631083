//! Provider rate card and ranking types
//!
//! A provider publishes time-versioned rate cards. For a given
//! (provider, currency) at most one card is active at any instant: the one
//! with the greatest effective time not later than that instant. Cards are
//! bulk-loaded once per run, never mutated, and the whole table is truncated
//! when the run ends.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Provider identifier
pub type ProviderId = u32;

/// One time-versioned rate card for a payment provider
///
/// Versioned by `(provider_id, effective_time)`; a later-dated card
/// supersedes an earlier one without replacing it in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRateCard {
    /// The provider this card belongs to
    pub provider_id: ProviderId,

    /// When this card version becomes active
    pub effective_time: NaiveDateTime,

    /// Historical conversion (success) rate, in [0, 1]
    pub conversion_rate: f64,

    /// Average processing time reported for the provider
    pub avg_processing_time: f64,

    /// Minimum payment amount this card covers
    pub min_amount: Decimal,

    /// Maximum payment amount this card covers
    pub max_amount: Decimal,

    /// Lower routing limit, forwarded to the ranking service
    pub limit_min: Decimal,

    /// Upper routing limit, forwarded to the ranking service
    pub limit_max: Decimal,

    /// Commission fraction retained by the provider, in [0, 1]
    pub commission: f64,

    /// Currency this card applies to
    pub currency: String,
}

impl ProviderRateCard {
    /// Whether this card covers the given payment parameters
    ///
    /// A card matches when the currency is equal, the card was effective at
    /// the payment's event time, and the amount falls inside the card's
    /// inclusive amount range.
    pub fn matches(&self, currency: &str, as_of: NaiveDateTime, amount: Decimal) -> bool {
        self.currency == currency
            && self.effective_time <= as_of
            && amount >= self.min_amount
            && amount <= self.max_amount
    }
}

/// A provider summary returned by the ranking service
///
/// The service may recompute conversion, timing and commission figures, so
/// these values can differ slightly from the source rate card. Field names
/// follow the service's wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProvider {
    /// Provider id, matching the id of an eligible rate card
    pub id: ProviderId,

    /// The service's view of the provider's conversion rate
    pub conversion: f64,

    /// The service's view of the provider's average processing time
    #[serde(rename = "avg_time")]
    pub avg_processing_time: f64,

    /// The service's view of the provider's commission fraction
    pub commission: f64,
}
