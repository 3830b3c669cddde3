//! Persistence abstraction for cached rates and conversion history

use crate::core::currency::{ConversionRecord, RateEntry, RatePair};
use crate::core::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RateStore: Send + Sync {
    /// Looks up the cached rate for exactly this directional pair.
    async fn get(&self, pair: &RatePair) -> Result<Option<RateEntry>>;

    /// Inserts or replaces the rate for `pair`. Durable once it returns.
    async fn put(&self, pair: &RatePair, rate: f64) -> Result<RateEntry>;

    /// Inserts or replaces several rates as one atomic write.
    ///
    /// Either every rate is stored or none is. Durable once it returns.
    async fn put_many(&self, rates: &[(RatePair, f64)]) -> Result<()>;

    /// All cached entries ordered by pair.
    async fn entries(&self) -> Result<Vec<RateEntry>>;

    /// Appends a record to the conversion ledger. Durable once it returns.
    async fn append_history(&self, record: &ConversionRecord) -> Result<()>;

    /// Up to `limit` most recent records, newest first. A zero limit is an error.
    async fn recent_history(&self, limit: usize) -> Result<Vec<ConversionRecord>>;
}
