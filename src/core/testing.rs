//! Test doubles shared by the core unit tests.

use crate::core::currency::{ConversionRecord, CurrencyCode, RateEntry, RatePair};
use crate::core::error::{FxError, Result};
use crate::core::provider::{RateProvider, RateTable};
use crate::core::store::RateStore;
use crate::store::MemoryRateStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Provider that answers from a scripted table per base currency.
///
/// Bases without a script fail with `ProviderUnavailable`.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<HashMap<CurrencyCode, Result<RateTable>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rates(self, base: &str, rates: &[(&str, f64)]) -> Self {
        let table = rates
            .iter()
            .map(|(code, rate)| (CurrencyCode::new(code).unwrap(), *rate))
            .collect();
        self.responses
            .lock()
            .unwrap()
            .insert(CurrencyCode::new(base).unwrap(), Ok(table));
        self
    }

    pub fn with_error(self, base: &str, err: FxError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(CurrencyCode::new(base).unwrap(), Err(err));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateProvider for ScriptedProvider {
    async fn fetch_rates_for(&self, base: &CurrencyCode) -> Result<RateTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .get(base)
            .cloned()
            .unwrap_or_else(|| Err(FxError::ProviderUnavailable(format!("no route to {base}"))))
    }
}

/// Store whose writes can be made to fail with `PersistenceFailure`.
/// Reads always go to the wrapped memory store.
pub struct FailingStore {
    inner: MemoryRateStore,
    fail_puts: bool,
    fail_appends: bool,
}

impl FailingStore {
    pub fn new(inner: MemoryRateStore) -> Self {
        Self {
            inner,
            fail_puts: false,
            fail_appends: false,
        }
    }

    pub fn failing_puts(mut self) -> Self {
        self.fail_puts = true;
        self
    }

    pub fn failing_appends(mut self) -> Self {
        self.fail_appends = true;
        self
    }

    pub fn inner(&self) -> &MemoryRateStore {
        &self.inner
    }

    fn disk_full() -> FxError {
        FxError::PersistenceFailure("disk full".to_string())
    }
}

#[async_trait]
impl RateStore for FailingStore {
    async fn get(&self, pair: &RatePair) -> Result<Option<RateEntry>> {
        self.inner.get(pair).await
    }

    async fn put(&self, pair: &RatePair, rate: f64) -> Result<RateEntry> {
        if self.fail_puts {
            return Err(Self::disk_full());
        }
        self.inner.put(pair, rate).await
    }

    async fn put_many(&self, rates: &[(RatePair, f64)]) -> Result<()> {
        if self.fail_puts {
            return Err(Self::disk_full());
        }
        self.inner.put_many(rates).await
    }

    async fn entries(&self) -> Result<Vec<RateEntry>> {
        self.inner.entries().await
    }

    async fn append_history(&self, record: &ConversionRecord) -> Result<()> {
        if self.fail_appends {
            return Err(Self::disk_full());
        }
        self.inner.append_history(record).await
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<ConversionRecord>> {
        self.inner.recent_history(limit).await
    }
}

pub fn code(s: &str) -> CurrencyCode {
    CurrencyCode::new(s).unwrap()
}
