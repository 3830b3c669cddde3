use crate::core::currency::{ConversionRecord, RateEntry, RatePair};
use crate::core::error::{FxError, Result};
use crate::core::store::RateStore;
use crate::store::{ensure_storable_rate, ensure_storable_record};
use async_trait::async_trait;
use chrono::Utc;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

const RATES_PARTITION: &str = "rates";
const HISTORY_PARTITION: &str = "history";

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| FxError::PersistenceFailure(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| FxError::PersistenceFailure(e.to_string()))
}

fn decode_sequence(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key.try_into().map_err(|_| {
        FxError::PersistenceFailure(format!("Malformed history key of {} bytes", key.len()))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

/// Durable rate store on a fjall keyspace.
///
/// Rates live in the `rates` partition keyed by `FROM_TO`, and are mirrored
/// in memory so lookups never touch disk. Conversions are appended to the
/// `history` partition under a big-endian sequence number, which keeps the
/// ledger in insertion order for reverse scans.
pub struct FjallRateStore {
    keyspace: Keyspace,
    rates: PartitionHandle,
    history: PartitionHandle,
    cache: RwLock<HashMap<RatePair, RateEntry>>,
    next_seq: Mutex<u64>,
}

impl FjallRateStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path).map_err(|e| {
            FxError::PersistenceFailure(format!(
                "Failed to create data directory {}: {}",
                path.display(),
                e
            ))
        })?;

        let keyspace = Config::new(path).open()?;
        let rates = keyspace.open_partition(RATES_PARTITION, PartitionCreateOptions::default())?;
        let history =
            keyspace.open_partition(HISTORY_PARTITION, PartitionCreateOptions::default())?;

        let mut cache = HashMap::new();
        for item in rates.iter() {
            let (_, value) = item?;
            let entry: RateEntry = decode(&value)?;
            cache.insert(entry.pair.clone(), entry);
        }

        let next_seq = match history.last_key_value()? {
            Some((key, _)) => decode_sequence(&key)? + 1,
            None => 0,
        };
        debug!(
            rates = cache.len(),
            next_seq, "Opened rate store at {}", path.display()
        );

        Ok(Self {
            keyspace,
            rates,
            history,
            cache: RwLock::new(cache),
            next_seq: Mutex::new(next_seq),
        })
    }

    fn sync(&self) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

#[async_trait]
impl RateStore for FjallRateStore {
    async fn get(&self, pair: &RatePair) -> Result<Option<RateEntry>> {
        let cache = self.cache.read().await;
        let entry = cache.get(pair).cloned();
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

        // Holding the write lock serialises writers and keeps disk and memory in step.
        let mut cache = self.cache.write().await;
        self.rates
            .insert(pair.storage_key().into_bytes(), encode(&entry)?)?;
        self.sync()?;
        cache.insert(pair.clone(), entry.clone());
        debug!("Cache PUT for pair: {}", pair);
        Ok(entry)
    }

    async fn put_many(&self, rates: &[(RatePair, f64)]) -> Result<()> {
        let observed_at = Utc::now();
        let entries = rates
            .iter()
            .map(|(pair, rate)| {
                ensure_storable_rate(pair, *rate)?;
                Ok(RateEntry {
                    pair: pair.clone(),
                    rate: *rate,
                    observed_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut batch = self.keyspace.batch();
        for entry in &entries {
            batch.insert(
                &self.rates,
                entry.pair.storage_key().into_bytes(),
                encode(entry)?,
            );
        }

        let mut cache = self.cache.write().await;
        batch.commit()?;
        self.sync()?;
        for entry in entries {
            cache.insert(entry.pair.clone(), entry);
        }
        debug!(count = rates.len(), "Cache PUT batch");
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<RateEntry>> {
        let cache = self.cache.read().await;
        let mut entries: Vec<RateEntry> = cache.values().cloned().collect();
        entries.sort_by(|a, b| a.pair.cmp(&b.pair));
        Ok(entries)
    }

    async fn append_history(&self, record: &ConversionRecord) -> Result<()> {
        ensure_storable_record(record)?;
        let mut next_seq = self.next_seq.lock().await;
        self.history
            .insert(next_seq.to_be_bytes().to_vec(), encode(record)?)?;
        self.sync()?;
        debug!(seq = *next_seq, "Appended conversion {}", record.pair);
        *next_seq += 1;
        Ok(())
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<ConversionRecord>> {
        if limit == 0 {
            return Err(FxError::InvalidLimit(limit));
        }
        self.history
            .iter()
            .rev()
            .take(limit)
            .map(|item| {
                let (_, value) = item?;
                decode(&value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(amount: f64, rate: f64) -> ConversionRecord {
        ConversionRecord {
            amount,
            pair: RatePair::parse("EUR", "GBP").unwrap(),
            rate,
            result: amount * rate,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_fjall_store_get_put() {
        let dir = tempdir().unwrap();
        let store = FjallRateStore::open(dir.path()).unwrap();
        let pair = RatePair::parse("USD", "EUR").unwrap();

        // Initially, store is empty
        assert!(store.get(&pair).await.unwrap().is_none());

        store.put(&pair, 0.91).await.unwrap();
        store.put(&pair, 0.92).await.unwrap();

        // Last write wins, reverse pair untouched
        assert_eq!(store.get(&pair).await.unwrap().unwrap().rate, 0.92);
        assert!(store.get(&pair.inverse()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fjall_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let pair = RatePair::parse("GBP", "JPY").unwrap();
        {
            let store = FjallRateStore::open(dir.path()).unwrap();
            store.put(&pair, 190.5).await.unwrap();
            store.append_history(&record(1.0, 0.8)).await.unwrap();
            store.append_history(&record(2.0, 0.8)).await.unwrap();
        }

        let store = FjallRateStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&pair).await.unwrap().unwrap().rate, 190.5);
        assert_eq!(store.entries().await.unwrap().len(), 1);

        // Sequence continues after the persisted records
        store.append_history(&record(3.0, 0.8)).await.unwrap();
        let amounts: Vec<f64> = store
            .recent_history(10)
            .await
            .unwrap()
            .iter()
            .map(|r| r.amount)
            .collect();
        assert_eq!(amounts, vec![3.0, 2.0, 1.0]);
    }

    #[tokio::test]
    async fn test_fjall_store_recent_history_limit() {
        let dir = tempdir().unwrap();
        let store = FjallRateStore::open(dir.path()).unwrap();

        for i in 0..5 {
            store.append_history(&record(i as f64, 1.1)).await.unwrap();
        }

        let recent = store.recent_history(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].amount, 4.0);
        assert_eq!(recent[2].amount, 2.0);

        assert_eq!(
            store.recent_history(0).await,
            Err(FxError::InvalidLimit(0))
        );
    }

    #[tokio::test]
    async fn test_fjall_store_put_many_survives_reopen() {
        let dir = tempdir().unwrap();
        let usd_eur = RatePair::parse("USD", "EUR").unwrap();
        let usd_jpy = RatePair::parse("USD", "JPY").unwrap();
        {
            let store = FjallRateStore::open(dir.path()).unwrap();
            store
                .put_many(&[(usd_eur.clone(), 0.92), (usd_jpy.clone(), 148.5)])
                .await
                .unwrap();
        }

        let store = FjallRateStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&usd_eur).await.unwrap().unwrap().rate, 0.92);
        assert_eq!(store.get(&usd_jpy).await.unwrap().unwrap().rate, 148.5);
    }

    #[tokio::test]
    async fn test_fjall_store_refuses_non_finite_values() {
        let dir = tempdir().unwrap();
        let usd_eur = RatePair::parse("USD", "EUR").unwrap();
        let usd_jpy = RatePair::parse("USD", "JPY").unwrap();
        {
            let store = FjallRateStore::open(dir.path()).unwrap();
            assert!(matches!(
                store.put(&usd_eur, f64::INFINITY).await,
                Err(FxError::PersistenceFailure(_))
            ));
            // One bad rate keeps the whole batch out
            assert!(
                store
                    .put_many(&[(usd_eur.clone(), 0.92), (usd_jpy.clone(), f64::NAN)])
                    .await
                    .is_err()
            );

            let mut overflowed = record(1e308, 150.0);
            overflowed.result = overflowed.amount * overflowed.rate;
            assert!(matches!(
                store.append_history(&overflowed).await,
                Err(FxError::PersistenceFailure(_))
            ));
            store.append_history(&record(2.0, 0.8)).await.unwrap();
        }

        // Nothing unreadable reached disk, so the store reopens and the ledger scans
        let store = FjallRateStore::open(dir.path()).unwrap();
        assert!(store.entries().await.unwrap().is_empty());
        let history = store.recent_history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, 2.0);
    }

    #[tokio::test]
    async fn test_fjall_store_entries_sorted() {
        let dir = tempdir().unwrap();
        let store = FjallRateStore::open(dir.path()).unwrap();

        store.put(&RatePair::parse("USD", "JPY").unwrap(), 150.0).await.unwrap();
        store.put(&RatePair::parse("EUR", "USD").unwrap(), 1.08).await.unwrap();
        store.put(&RatePair::parse("USD", "EUR").unwrap(), 0.92).await.unwrap();

        let keys: Vec<String> = store
            .entries()
            .await
            .unwrap()
            .iter()
            .map(|e| e.pair.storage_key())
            .collect();
        assert_eq!(keys, vec!["EUR_USD", "USD_EUR", "USD_JPY"]);
    }
}
