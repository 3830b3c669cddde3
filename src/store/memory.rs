use crate::core::currency::{ConversionRecord, RateEntry, RatePair};
use crate::core::error::{FxError, Result};
use crate::core::store::RateStore;
use crate::store::{ensure_storable_rate, ensure_storable_record};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Non-durable rate store backed by a HashMap and a Vec ledger
#[derive(Default)]
pub struct MemoryRateStore {
    rates: RwLock<HashMap<RatePair, RateEntry>>,
    history: Mutex<Vec<ConversionRecord>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn get(&self, pair: &RatePair) -> Result<Option<RateEntry>> {
        let rates = self.rates.read().await;
        let entry = rates.get(pair).cloned();
        if entry.is_some() {
            debug!("Cache HIT for pair: {}", pair);
        } else {
            debug!("Cache MISS for pair: {}", pair);
        }
        Ok(entry)
    }

    async fn put(&self, pair: &RatePair, rate: f64) -> Result<RateEntry> {
        ensure_storable_rate(pair, rate)?;
        let entry = RateEntry {
            pair: pair.clone(),
            rate,
            observed_at: Utc::now(),
        };
        let mut rates = self.rates.write().await;
        debug!("Cache PUT for pair: {}", pair);
        rates.insert(pair.clone(), entry.clone());
        Ok(entry)
    }

    async fn put_many(&self, rates: &[(RatePair, f64)]) -> Result<()> {
        for (pair, rate) in rates {
            ensure_storable_rate(pair, *rate)?;
        }
        let observed_at = Utc::now();
        let mut cache = self.rates.write().await;
        for (pair, rate) in rates {
            let entry = RateEntry {
                pair: pair.clone(),
                rate: *rate,
                observed_at,
            };
            cache.insert(pair.clone(), entry);
        }
        debug!(count = rates.len(), "Cache PUT batch");
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<RateEntry>> {
        let rates = self.rates.read().await;
        let mut entries: Vec<RateEntry> = rates.values().cloned().collect();
        entries.sort_by(|a, b| a.pair.cmp(&b.pair));
        Ok(entries)
    }

    async fn append_history(&self, record: &ConversionRecord) -> Result<()> {
        ensure_storable_record(record)?;
        self.history.lock().await.push(record.clone());
        Ok(())
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<ConversionRecord>> {
        if limit == 0 {
            return Err(FxError::InvalidLimit(limit));
        }
        let history = self.history.lock().await;
        Ok(history.iter().rev().take(limit).cloned().collect())
    }
}
