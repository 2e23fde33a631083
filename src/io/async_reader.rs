//! Asynchronous CSV reader for the payments stream
//!
//! Provides a streaming interface over raw payment rows from a CSV source.
//! Rows are pulled one at a time, so memory usage stays constant no matter
//! how large the input file is.
//!
//! # Design
//!
//! The PaymentReader uses:
//! - csv-async for streaming CSV parsing
//! - futures streams so the pipeline can bound in-flight rows with
//!   `buffered` while the reader is only polled when downstream has capacity

use crate::io::csv_format::PaymentCsvRecord;
use crate::types::PipelineError;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::{Stream, StreamExt};

/// Asynchronous payments CSV reader
///
/// Wraps a csv-async deserializer configured for the payments file format.
pub struct PaymentReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send> PaymentReader<R> {
    /// Create a new PaymentReader from an async byte reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Stream raw payment rows in input order
    ///
    /// Each item is either a raw record or a row-level parse error; a bad
    /// row never terminates the stream, so one malformed line cannot abort
    /// the batch on its own.
    pub fn records(
        &mut self,
    ) -> impl Stream<Item = Result<PaymentCsvRecord, PipelineError>> + '_ {
        self.csv_reader
            .deserialize::<PaymentCsvRecord>()
            .map(|record| record.map_err(PipelineError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;
    use futures::stream::StreamExt;

    const HEADER: &str = "eventTimeRes,amount,cur,payment,cardToken\n";

    #[tokio::test]
    async fn test_reader_yields_rows_in_order() {
        let csv_content = format!(
            "{}2024-01-10 00:00:00,100,USD,card,tok_1\n2024-01-11 00:00:00,50,EUR,wallet,tok_2\n",
            HEADER
        );
        let mut reader = PaymentReader::new(Cursor::new(csv_content.into_bytes()));

        let rows: Vec<_> = reader.records().collect().await;
        assert_eq!(rows.len(), 2);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.amount, "100");
        assert_eq!(first.currency, "USD");

        let second = rows[1].as_ref().unwrap();
        assert_eq!(second.currency, "EUR");
        assert_eq!(second.card_token, "tok_2");
    }

    #[tokio::test]
    async fn test_reader_empty_file() {
        let mut reader = PaymentReader::new(Cursor::new(HEADER.as_bytes().to_vec()));
        let rows: Vec<_> = reader.records().collect().await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_reader_reports_failed_row_by_data_row_number() {
        // The truncated record is the second data row; its error must carry
        // row 2, not the physical file line (3).
        let csv_content = format!(
            "{}2024-01-10 00:00:00,100,USD,card,tok_1\n2024-01-11 00:00:00,50\n",
            HEADER
        );
        let mut reader = PaymentReader::new(Cursor::new(csv_content.into_bytes()));

        let rows: Vec<_> = reader.records().collect().await;
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_ok());
        assert!(matches!(
            rows[1].as_ref().unwrap_err(),
            PipelineError::MalformedInput { row: Some(2), .. }
        ));
    }

    #[tokio::test]
    async fn test_reader_trims_whitespace() {
        let csv_content = format!("{}  2024-01-10 00:00:00 , 100 , USD , card , tok_1 \n", HEADER);
        let mut reader = PaymentReader::new(Cursor::new(csv_content.into_bytes()));

        let rows: Vec<_> = reader.records().collect().await;
        let record = rows[0].as_ref().unwrap();
        assert_eq!(record.amount, "100");
        assert_eq!(record.currency, "USD");
    }
}
