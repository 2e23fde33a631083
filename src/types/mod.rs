//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `payment`: Payment records and run statistics
//! - `provider`: Provider rate cards and ranking types
//! - `error`: Error types for the routing pipeline

pub mod error;
pub mod payment;
pub mod provider;

pub use error::PipelineError;
pub use payment::{PaymentRecord, RunStatistics};
pub use provider::{ProviderId, ProviderRateCard, RankedProvider};
