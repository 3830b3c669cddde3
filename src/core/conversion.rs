//! Amount conversion on top of the rate resolver

use crate::core::currency::{ConversionRecord, CurrencyCode, RateEntry, RatePair};
use crate::core::error::{FxError, Result};
use crate::core::resolver::RateResolver;
use crate::core::store::RateStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Entry point for adapters: resolves rates, converts amounts and keeps the
/// conversion ledger.
pub struct ConversionService {
    resolver: RateResolver,
    store: Arc<dyn RateStore>,
    currencies: Vec<CurrencyCode>,
}

impl ConversionService {
    pub fn new(
        resolver: RateResolver,
        store: Arc<dyn RateStore>,
        currencies: Vec<CurrencyCode>,
    ) -> Self {
        Self {
            resolver,
            store,
            currencies,
        }
    }

    pub async fn resolve(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<f64> {
        self.resolver.resolve(from, to).await
    }

    /// Converts `amount` of `from` into `to` and records it in the ledger.
    ///
    /// Zero is a valid amount; negative or non-finite amounts are rejected
    /// before any rate is resolved. An amount whose converted value does not
    /// fit in an `f64` is rejected too, and nothing is recorded for it.
    pub async fn convert(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ConversionRecord> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(FxError::InvalidAmount(amount));
        }

        let rate = self.resolver.resolve(from, to).await?;
        let result = amount * rate;
        if !result.is_finite() {
            debug!(amount, rate, "Conversion result overflows");
            return Err(FxError::InvalidAmount(amount));
        }
        let record = ConversionRecord {
            amount,
            pair: RatePair::new(from.clone(), to.clone()),
            rate,
            result,
            timestamp: Utc::now(),
        };
        self.store.append_history(&record).await?;
        debug!(
            amount,
            result = record.result,
            "Converted {}",
            record.pair
        );
        Ok(record)
    }

    /// Converts in the opposite direction, i.e. `to` into `from`.
    pub async fn swap(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ConversionRecord> {
        self.convert(amount, to, from).await
    }

    pub async fn recent_history(&self, limit: usize) -> Result<Vec<ConversionRecord>> {
        self.store.recent_history(limit).await
    }

    pub async fn cached_rates(&self) -> Result<Vec<RateEntry>> {
        self.store.entries().await
    }

    pub fn supported_currencies(&self) -> &[CurrencyCode] {
        &self.currencies
    }
}
