//! CSV format handling for payments, provider cards, currency rates and output
//!
//! This module centralizes all CSV format concerns, providing:
//! - Raw record structures for deserialization of the three input files
//! - Conversion from raw records to domain types
//! - Enriched output row serialization
//!
//! Conversion functions are pure (no I/O) for easy testing. Column names
//! follow the upstream file formats: payments use camelCase headers
//! (`eventTimeRes`, `cardToken`, ...), provider cards use upper-case headers
//! (`TIME`, `ID`, `CONVERSION`, ...), and the rate file uses
//! `destination,rate`.

use crate::types::{PaymentRecord, PipelineError, ProviderId, ProviderRateCard};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Raw payment row as it appears in the payments CSV
///
/// All fields are kept as strings so a malformed value fails the single row
/// during conversion instead of poisoning deserialization of the stream.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PaymentCsvRecord {
    /// Payment event timestamp (ISO-8601-like)
    #[serde(rename = "eventTimeRes")]
    pub event_time: String,

    /// Payment amount as a decimal string
    pub amount: String,

    /// Currency code
    #[serde(rename = "cur")]
    pub currency: String,

    /// Payment method label
    #[serde(rename = "payment")]
    pub payment_method: String,

    /// Opaque card token
    #[serde(rename = "cardToken")]
    pub card_token: String,
}

/// Raw provider rate-card row as it appears in the providers CSV
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProviderCsvRecord {
    #[serde(rename = "TIME")]
    pub effective_time: String,
    #[serde(rename = "ID")]
    pub provider_id: String,
    #[serde(rename = "CONVERSION")]
    pub conversion_rate: String,
    #[serde(rename = "AVG_TIME")]
    pub avg_processing_time: String,
    #[serde(rename = "MIN_SUM")]
    pub min_amount: String,
    #[serde(rename = "MAX_SUM")]
    pub max_amount: String,
    #[serde(rename = "LIMIT_MIN")]
    pub limit_min: String,
    #[serde(rename = "LIMIT_MAX")]
    pub limit_max: String,
    /// Optional card-level limit column, present in some provider exports
    /// and ignored by the pipeline.
    #[serde(rename = "LIMIT_BY_CARD", default)]
    pub limit_by_card: Option<String>,
    #[serde(rename = "COMMISSION")]
    pub commission: String,
    #[serde(rename = "CURRENCY")]
    pub currency: String,
}

/// Raw currency-rate row as it appears in the exchange-rates CSV
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RateCsvRecord {
    /// Currency code the rate converts from
    pub destination: String,

    /// Conversion factor to USD
    pub rate: String,
}

/// Parse an ISO-8601-like timestamp
///
/// Accepts `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` and a bare
/// `YYYY-MM-DD` (midnight), matching the formats observed in the source
/// files.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return Ok(ts);
        }
    }

    Err(format!("invalid timestamp '{}'", value))
}

fn parse_decimal(value: &str, field: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|_| format!("invalid {} '{}'", field, value))
}

fn parse_float(value: &str, field: &str) -> Result<f64, String> {
    f64::from_str(value.trim()).map_err(|_| format!("invalid {} '{}'", field, value))
}

/// Convert a raw payment row to a PaymentRecord
///
/// `row` is the 1-based input row number, used for error context. Any
/// unparseable field yields a row-level `MalformedInput` error.
pub fn convert_payment_record(
    record: &PaymentCsvRecord,
    row: u64,
) -> Result<PaymentRecord, PipelineError> {
    let event_time =
        parse_timestamp(&record.event_time).map_err(|e| PipelineError::malformed(row, e))?;
    let amount = parse_decimal(&record.amount, "amount")
        .map_err(|e| PipelineError::malformed(row, e))?;

    let currency = record.currency.trim().to_string();
    if currency.is_empty() {
        return Err(PipelineError::malformed(row, "empty currency code"));
    }

    Ok(PaymentRecord {
        event_time,
        amount,
        currency,
        payment_method: record.payment_method.clone(),
        card_token: record.card_token.clone(),
    })
}

/// Convert a raw provider row to a ProviderRateCard
pub fn convert_provider_record(record: &ProviderCsvRecord) -> Result<ProviderRateCard, String> {
    let provider_id = ProviderId::from_str(record.provider_id.trim())
        .map_err(|_| format!("invalid provider id '{}'", record.provider_id))?;

    Ok(ProviderRateCard {
        provider_id,
        effective_time: parse_timestamp(&record.effective_time)?,
        conversion_rate: parse_float(&record.conversion_rate, "conversion rate")?,
        avg_processing_time: parse_float(&record.avg_processing_time, "avg processing time")?,
        min_amount: parse_decimal(&record.min_amount, "min amount")?,
        max_amount: parse_decimal(&record.max_amount, "max amount")?,
        limit_min: parse_decimal(&record.limit_min, "limit min")?,
        limit_max: parse_decimal(&record.limit_max, "limit max")?,
        commission: parse_float(&record.commission, "commission")?,
        currency: record.currency.trim().to_string(),
    })
}

/// Convert a raw rate row to a (code, usd_rate) pair
pub fn convert_rate_record(record: &RateCsvRecord) -> Result<(String, f64), String> {
    let code = record.destination.trim().to_string();
    if code.is_empty() {
        return Err("empty currency code in rate table".to_string());
    }
    let rate = parse_float(&record.rate, "rate")?;
    Ok((code, rate))
}

/// Writer for enriched payment rows
///
/// Echoes the raw input fields, appends the ranked `providersPriority`
/// string and, when profit estimation is enabled, an `expectedProfitUSD`
/// column. The header is written on construction so even an empty run
/// produces a well-formed file.
pub struct OutputWriter<W: Write> {
    writer: csv::Writer<W>,
    with_profit: bool,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new OutputWriter and write the header row
    pub fn new(output: W, with_profit: bool) -> Result<Self, PipelineError> {
        let mut writer = csv::Writer::from_writer(output);

        let mut header = vec![
            "eventTimeRes",
            "amount",
            "cur",
            "payment",
            "cardToken",
            "providersPriority",
        ];
        if with_profit {
            header.push("expectedProfitUSD");
        }
        writer
            .write_record(&header)
            .map_err(|e| PipelineError::sink_failure(e.to_string()))?;

        Ok(Self {
            writer,
            with_profit,
        })
    }

    /// Write one enriched row
    ///
    /// `profit_usd` must be present exactly when the writer was constructed
    /// with profit enabled; a `None` in that case writes an empty cell.
    pub fn write_row(
        &mut self,
        raw: &PaymentCsvRecord,
        providers_priority: &str,
        profit_usd: Option<f64>,
    ) -> Result<(), PipelineError> {
        let mut fields = vec![
            raw.event_time.clone(),
            raw.amount.clone(),
            raw.currency.clone(),
            raw.payment_method.clone(),
            raw.card_token.clone(),
            providers_priority.to_string(),
        ];
        if self.with_profit {
            fields.push(
                profit_usd
                    .map(|p| format!("{:.4}", p))
                    .unwrap_or_default(),
            );
        }

        self.writer
            .write_record(&fields)
            .map_err(|e| PipelineError::sink_failure(e.to_string()))
    }

    /// Flush buffered rows to the underlying writer
    pub fn flush(&mut self) -> Result<(), PipelineError> {
        self.writer
            .flush()
            .map_err(|e| PipelineError::sink_failure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn payment_record(event_time: &str, amount: &str, currency: &str) -> PaymentCsvRecord {
        PaymentCsvRecord {
            event_time: event_time.to_string(),
            amount: amount.to_string(),
            currency: currency.to_string(),
            payment_method: "card".to_string(),
            card_token: "tok_1".to_string(),
        }
    }

    #[rstest]
    #[case::space_separated("2024-01-10 14:30:00")]
    #[case::t_separated("2024-01-10T14:30:00")]
    fn test_parse_timestamp_datetime(#[case] value: &str) {
        let ts = parse_timestamp(value).unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-10 14:30:00");
    }

    #[test]
    fn test_parse_timestamp_date_only() {
        let ts = parse_timestamp("2024-01-10").unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-10 00:00:00");
    }

    #[rstest]
    #[case::garbage("yesterday")]
    #[case::empty("")]
    #[case::wrong_order("10-01-2024")]
    fn test_parse_timestamp_invalid(#[case] value: &str) {
        assert!(parse_timestamp(value).is_err());
    }

    #[test]
    fn test_convert_payment_record_valid() {
        let raw = payment_record("2024-01-10 00:00:00", "100.50", "USD");
        let payment = convert_payment_record(&raw, 1).unwrap();

        assert_eq!(payment.amount, Decimal::new(10050, 2));
        assert_eq!(payment.currency, "USD");
        assert_eq!(payment.payment_method, "card");
        assert_eq!(payment.card_token, "tok_1");
    }

    #[rstest]
    #[case::bad_amount("2024-01-10", "not_a_number", "USD", "invalid amount")]
    #[case::bad_timestamp("soon", "100", "USD", "invalid timestamp")]
    #[case::empty_currency("2024-01-10", "100", "  ", "empty currency")]
    fn test_convert_payment_record_errors(
        #[case] event_time: &str,
        #[case] amount: &str,
        #[case] currency: &str,
        #[case] expected_error: &str,
    ) {
        let raw = payment_record(event_time, amount, currency);
        let err = convert_payment_record(&raw, 7).unwrap_err();

        assert!(matches!(err, PipelineError::MalformedInput { row: Some(7), .. }));
        assert!(err.to_string().contains(expected_error));
    }

    fn provider_record() -> ProviderCsvRecord {
        ProviderCsvRecord {
            effective_time: "2024-01-01 00:00:00".to_string(),
            provider_id: "1".to_string(),
            conversion_rate: "0.8".to_string(),
            avg_processing_time: "12.5".to_string(),
            min_amount: "10".to_string(),
            max_amount: "200".to_string(),
            limit_min: "5".to_string(),
            limit_max: "500".to_string(),
            limit_by_card: None,
            commission: "0.1".to_string(),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_convert_provider_record_valid() {
        let card = convert_provider_record(&provider_record()).unwrap();

        assert_eq!(card.provider_id, 1);
        assert_eq!(card.conversion_rate, 0.8);
        assert_eq!(card.min_amount, Decimal::from(10));
        assert_eq!(card.max_amount, Decimal::from(200));
        assert_eq!(card.commission, 0.1);
        assert_eq!(card.currency, "USD");
    }

    #[rstest]
    #[case::bad_id(|r: &mut ProviderCsvRecord| r.provider_id = "abc".to_string(), "invalid provider id")]
    #[case::bad_conversion(|r: &mut ProviderCsvRecord| r.conversion_rate = "high".to_string(), "invalid conversion rate")]
    #[case::bad_min(|r: &mut ProviderCsvRecord| r.min_amount = "ten".to_string(), "invalid min amount")]
    #[case::bad_time(|r: &mut ProviderCsvRecord| r.effective_time = "never".to_string(), "invalid timestamp")]
    fn test_convert_provider_record_errors(
        #[case] mutate: fn(&mut ProviderCsvRecord),
        #[case] expected_error: &str,
    ) {
        let mut record = provider_record();
        mutate(&mut record);
        let err = convert_provider_record(&record).unwrap_err();
        assert!(err.contains(expected_error));
    }

    #[rstest]
    #[case::usd("USD", "1.0", Some(("USD", 1.0)))]
    #[case::eur("EUR", "1.08", Some(("EUR", 1.08)))]
    #[case::trimmed(" JPY ", " 0.0067 ", Some(("JPY", 0.0067)))]
    #[case::bad_rate("EUR", "lots", None)]
    #[case::empty_code("  ", "1.0", None)]
    fn test_convert_rate_record(
        #[case] destination: &str,
        #[case] rate: &str,
        #[case] expected: Option<(&str, f64)>,
    ) {
        let record = RateCsvRecord {
            destination: destination.to_string(),
            rate: rate.to_string(),
        };
        let result = convert_rate_record(&record);
        match expected {
            Some((code, rate)) => assert_eq!(result.unwrap(), (code.to_string(), rate)),
            None => assert!(result.is_err()),
        }
    }

    #[test]
    fn test_output_writer_with_profit() {
        let mut output = Vec::new();
        {
            let mut writer = OutputWriter::new(&mut output, true).unwrap();
            let raw = payment_record("2024-01-10 00:00:00", "100", "USD");
            writer.write_row(&raw, "2-1", Some(72.0)).unwrap();
            writer.flush().unwrap();
        }

        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "eventTimeRes,amount,cur,payment,cardToken,providersPriority,expectedProfitUSD\n\
             2024-01-10 00:00:00,100,USD,card,tok_1,2-1,72.0000\n"
        );
    }

    #[test]
    fn test_output_writer_without_profit() {
        let mut output = Vec::new();
        {
            let mut writer = OutputWriter::new(&mut output, false).unwrap();
            let raw = payment_record("2024-01-10 00:00:00", "100", "USD");
            writer.write_row(&raw, "", None).unwrap();
            writer.flush().unwrap();
        }

        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "eventTimeRes,amount,cur,payment,cardToken,providersPriority\n\
             2024-01-10 00:00:00,100,USD,card,tok_1,\n"
        );
    }

    #[test]
    fn test_output_writer_header_only_for_empty_run() {
        let mut output = Vec::new();
        {
            let mut writer = OutputWriter::new(&mut output, true).unwrap();
            writer.flush().unwrap();
        }

        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "eventTimeRes,amount,cur,payment,cardToken,providersPriority,expectedProfitUSD\n"
        );
    }
}
