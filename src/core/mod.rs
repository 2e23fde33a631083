//! Core business logic module
//!
//! This module contains the per-payment enrichment components:
//! - `rate_table` - Currency-to-USD conversion factors
//! - `provider_store` - Bulk-loaded, time-versioned rate-card store
//! - `eligibility` - Latest-version-as-of-event-time provider resolution
//! - `profit` - Expected-profit estimation over the ranked provider set

pub mod eligibility;
pub mod profit;
pub mod provider_store;
pub mod rate_table;

pub use eligibility::EligibilityResolver;
pub use profit::ProfitEstimator;
pub use provider_store::{load_rate_cards, InMemoryProviderStore, ProviderStore};
pub use rate_table::RateTable;
