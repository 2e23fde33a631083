//! Expected-profit estimation
//!
//! The pipeline does not pick a provider itself; the routing decision is
//! made downstream among the ranked set. The estimator values that decision
//! space: it assumes each of the N ranked providers is equally likely to be
//! chosen (probability 1/N) and weights each provider's net-of-commission
//! payout by that probability and the provider's conversion rate.

use crate::core::rate_table::RateTable;
use crate::types::{PaymentRecord, PipelineError, RankedProvider};
use rust_decimal::prelude::ToPrimitive;

/// Computes the expected profit of a ranked provider set, in USD
pub struct ProfitEstimator {
    rates: RateTable,
}

impl ProfitEstimator {
    /// Create an estimator backed by the given rate table
    pub fn new(rates: RateTable) -> Self {
        Self { rates }
    }

    /// Estimate the expected profit for a payment and its ranked providers
    ///
    /// `expected = Σ amount_usd × (1 − commission_i) × (1/N) × conversion_i`
    ///
    /// An empty ranked set is worth exactly 0, not an error. A currency code
    /// missing from the rate table fails the row with `UnknownCurrency`;
    /// it is never treated as a zero conversion factor.
    pub fn estimate(
        &self,
        payment: &PaymentRecord,
        ranked: &[RankedProvider],
    ) -> Result<f64, PipelineError> {
        if ranked.is_empty() {
            return Ok(0.0);
        }

        let usd_rate = self.rates.usd_rate(&payment.currency)?;
        let amount_usd = payment.amount.to_f64().ok_or_else(|| {
            PipelineError::MalformedInput {
                row: None,
                message: format!("amount {} not representable as a float", payment.amount),
            }
        })? * usd_rate;

        let probability = 1.0 / ranked.len() as f64;
        let expected = ranked
            .iter()
            .map(|p| amount_usd * (1.0 - p.commission) * probability * p.conversion)
            .sum();

        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv_format::parse_timestamp;
    use rust_decimal::Decimal;

    fn payment(amount: i64, currency: &str) -> PaymentRecord {
        PaymentRecord {
            event_time: parse_timestamp("2024-01-10").unwrap(),
            amount: Decimal::from(amount),
            currency: currency.to_string(),
            payment_method: "card".to_string(),
            card_token: "tok_1".to_string(),
        }
    }

    fn ranked(id: u32, conversion: f64, commission: f64) -> RankedProvider {
        RankedProvider {
            id,
            conversion,
            avg_processing_time: 12.0,
            commission,
        }
    }

    fn usd_estimator() -> ProfitEstimator {
        let mut rates = RateTable::new();
        rates.insert("USD", 1.0);
        rates.insert("EUR", 2.0);
        ProfitEstimator::new(rates)
    }

    #[test]
    fn test_single_provider_exact_formula() {
        // probability term is 1 for a single ranked provider:
        // 100 * (1 - 0.1) * 1.0 * 0.8 = 72
        let estimator = usd_estimator();
        let profit = estimator
            .estimate(&payment(100, "USD"), &[ranked(1, 0.8, 0.1)])
            .unwrap();
        assert_eq!(profit, 72.0);
    }

    #[test]
    fn test_profit_is_linear_in_amount() {
        let estimator = usd_estimator();
        let providers = [ranked(1, 0.8, 0.1), ranked(2, 0.5, 0.3)];

        let base = estimator.estimate(&payment(100, "USD"), &providers).unwrap();
        let doubled = estimator.estimate(&payment(200, "USD"), &providers).unwrap();

        assert_eq!(doubled, base * 2.0);
    }

    #[test]
    fn test_uniform_probability_split() {
        // Two identical providers split the probability mass, so the total
        // equals the single-provider figure.
        let estimator = usd_estimator();
        let single = estimator
            .estimate(&payment(100, "USD"), &[ranked(1, 0.8, 0.1)])
            .unwrap();
        let split = estimator
            .estimate(&payment(100, "USD"), &[ranked(1, 0.8, 0.1), ranked(2, 0.8, 0.1)])
            .unwrap();

        assert!((single - split).abs() < 1e-9);
    }

    #[test]
    fn test_currency_conversion_applied() {
        let estimator = usd_estimator();
        let profit = estimator
            .estimate(&payment(100, "EUR"), &[ranked(1, 0.8, 0.1)])
            .unwrap();
        // 100 EUR * 2.0 = 200 USD, then * 0.9 * 0.8
        assert_eq!(profit, 144.0);
    }

    #[test]
    fn test_empty_ranked_set_is_zero() {
        let estimator = usd_estimator();
        let profit = estimator.estimate(&payment(100, "USD"), &[]).unwrap();
        assert_eq!(profit, 0.0);
    }

    #[test]
    fn test_unknown_currency_is_an_error_not_zero() {
        let estimator = usd_estimator();
        let err = estimator
            .estimate(&payment(100, "XYZ"), &[ranked(1, 0.8, 0.1)])
            .unwrap_err();
        assert_eq!(err, PipelineError::unknown_currency("XYZ"));
    }
}
