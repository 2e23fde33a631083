//! Currency-to-USD rate table
//!
//! Loaded once per run from the exchange-rates CSV and read-only afterwards.
//! The table is an open mapping from currency code to conversion factor; a
//! lookup miss is an explicit `UnknownCurrency` error, never a default-zero
//! rate, because a silent zero would zero out the profit aggregates.

use crate::io::csv_format::{convert_rate_record, RateCsvRecord};
use crate::types::PipelineError;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// In-memory mapping from currency code to USD conversion factor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Create an empty rate table
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a rate table from a CSV reader with `destination,rate` columns
    ///
    /// Malformed rows are skipped with a note on stderr; a row-level problem
    /// in the rate file must not abort the run before it starts, it only
    /// narrows the set of convertible currencies.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PipelineError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut table = Self::new();
        for result in csv_reader.deserialize::<RateCsvRecord>() {
            match result {
                Ok(record) => match convert_rate_record(&record) {
                    Ok((code, rate)) => table.insert(code, rate),
                    Err(e) => eprintln!("Skipping rate row: {}", e),
                },
                Err(e) => eprintln!("Skipping rate row: {}", e),
            }
        }

        Ok(table)
    }

    /// Load a rate table from a CSV file path
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Insert or replace a rate
    pub fn insert(&mut self, code: impl Into<String>, rate: f64) {
        self.rates.insert(code.into(), rate);
    }

    /// Look up the USD conversion factor for a currency code
    pub fn usd_rate(&self, code: &str) -> Result<f64, PipelineError> {
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| PipelineError::unknown_currency(code))
    }

    /// Number of currencies in the table
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether the table holds no rates at all
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_load_from_reader() {
        let csv_content = "destination,rate\nUSD,1.0\nEUR,1.08\nJPY,0.0067\n";
        let table = RateTable::from_reader(csv_content.as_bytes()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.usd_rate("USD").unwrap(), 1.0);
        assert_eq!(table.usd_rate("EUR").unwrap(), 1.08);
    }

    #[test]
    fn test_unknown_currency_is_an_error() {
        let table = RateTable::from_reader("destination,rate\nUSD,1.0\n".as_bytes()).unwrap();

        let err = table.usd_rate("XYZ").unwrap_err();
        assert_eq!(err, PipelineError::unknown_currency("XYZ"));
    }

    #[rstest]
    #[case::bad_rate("destination,rate\nUSD,1.0\nEUR,lots\n", 1)]
    #[case::empty_code("destination,rate\n ,1.0\nUSD,1.0\n", 1)]
    fn test_malformed_rows_are_skipped(#[case] csv_content: &str, #[case] expected_len: usize) {
        let table = RateTable::from_reader(csv_content.as_bytes()).unwrap();
        assert_eq!(table.len(), expected_len);
    }

    #[test]
    fn test_empty_file_gives_empty_table() {
        let table = RateTable::from_reader("destination,rate\n".as_bytes()).unwrap();
        assert!(table.is_empty());
    }
}
