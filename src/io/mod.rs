//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `async_reader` - Streaming async reader for the payments file

pub mod async_reader;
pub mod csv_format;

pub use async_reader::PaymentReader;
pub use csv_format::{
    convert_payment_record, convert_provider_record, convert_rate_record, OutputWriter,
    PaymentCsvRecord, ProviderCsvRecord, RateCsvRecord,
};
