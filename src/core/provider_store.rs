//! Provider rate-card store
//!
//! The store holds the bulk-loaded, time-versioned rate cards and answers
//! the per-payment range query. It is written once during load and only read
//! for the rest of the run; the whole table is truncated when the run ends,
//! so a rerun starts from a clean slate.
//!
//! The backing store is an external collaborator in principle (the original
//! system used a relational table with an upsert keyed by provider id and
//! effective time), so the boundary is an async trait. The in-memory
//! implementation is the one shipped with the pipeline.

use crate::io::csv_format::{convert_provider_record, ProviderCsvRecord};
use crate::types::{PipelineError, ProviderId, ProviderRateCard};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use csv_async::AsyncReaderBuilder;
use dashmap::DashMap;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Boundary to the range-query-capable rate-card store
#[async_trait]
pub trait ProviderStore: Send + Sync {
    /// Insert a rate card, idempotently
    ///
    /// Keyed by `(provider_id, effective_time)`; inserting a card under an
    /// existing key is a no-op (first write wins), which makes bulk loads
    /// safe to retry.
    async fn upsert(&self, card: ProviderRateCard) -> Result<(), PipelineError>;

    /// Return all cards matching the currency/time/amount predicate
    ///
    /// Matching means: equal currency, `effective_time <= as_of`, and
    /// `amount` within the card's inclusive `[min_amount, max_amount]`
    /// range. Multiple versions of the same provider may match; reducing to
    /// the latest version per provider is the eligibility resolver's job.
    async fn query_matching(
        &self,
        currency: &str,
        as_of: NaiveDateTime,
        amount: Decimal,
    ) -> Result<Vec<ProviderRateCard>, PipelineError>;

    /// Remove every card from the store
    async fn truncate(&self) -> Result<(), PipelineError>;

    /// Total number of stored card versions
    async fn card_count(&self) -> Result<usize, PipelineError>;
}

/// In-memory provider store
///
/// Cards are sharded by provider id; each provider's versions live in a
/// `BTreeMap` ordered by effective time, so the time-bounded scan per
/// provider is a range over the map.
#[derive(Debug, Default)]
pub struct InMemoryProviderStore {
    cards: DashMap<ProviderId, BTreeMap<NaiveDateTime, ProviderRateCard>>,
}

impl InMemoryProviderStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProviderStore for InMemoryProviderStore {
    async fn upsert(&self, card: ProviderRateCard) -> Result<(), PipelineError> {
        self.cards
            .entry(card.provider_id)
            .or_insert_with(BTreeMap::new)
            .entry(card.effective_time)
            .or_insert(card);
        Ok(())
    }

    async fn query_matching(
        &self,
        currency: &str,
        as_of: NaiveDateTime,
        amount: Decimal,
    ) -> Result<Vec<ProviderRateCard>, PipelineError> {
        let mut matching = Vec::new();

        for entry in self.cards.iter() {
            for card in entry.value().range(..=as_of).map(|(_, card)| card) {
                if card.matches(currency, as_of, amount) {
                    matching.push(card.clone());
                }
            }
        }

        Ok(matching)
    }

    async fn truncate(&self) -> Result<(), PipelineError> {
        self.cards.clear();
        Ok(())
    }

    async fn card_count(&self) -> Result<usize, PipelineError> {
        Ok(self.cards.iter().map(|entry| entry.value().len()).sum())
    }
}

/// Bulk-load rate cards from a providers CSV stream into the store
///
/// Streams the file row by row, so the providers file can be arbitrarily
/// large. Malformed rows are skipped with a note on stderr; store failures
/// are fatal and abort the load.
///
/// Returns the number of rows offered to the store (duplicates of an
/// existing `(provider_id, effective_time)` key still count as offered but
/// do not grow the table).
pub async fn load_rate_cards<R>(
    reader: R,
    store: &dyn ProviderStore,
) -> Result<u64, PipelineError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut csv_reader = AsyncReaderBuilder::new()
        .flexible(true)
        .trim(csv_async::Trim::All)
        .create_deserializer(reader);

    let mut loaded = 0u64;
    let mut records = csv_reader.deserialize::<ProviderCsvRecord>();

    while let Some(result) = records.next().await {
        match result {
            Ok(record) => match convert_provider_record(&record) {
                Ok(card) => {
                    store.upsert(card).await?;
                    loaded += 1;
                }
                Err(e) => eprintln!("Skipping provider row: {}", e),
            },
            Err(e) => eprintln!("Skipping provider row: {}", e),
        }
    }

    Ok(loaded)
}
