//! Exchange rate resolution.
//!
//! A rate is looked up through an ordered list of strategies and the first
//! one to produce a rate wins:
//!
//! 1. identity (`from == to`)
//! 2. direct cache hit
//! 3. direct fetch from the provider, caching every rate in the response
//! 4. inversion of a cached reverse rate (not written back)
//! 5. triangulation through the pivot currency (written back)
//!
//! Triangulation hops only run steps 1-4, so resolution is at most two hops deep.

use crate::core::currency::{CurrencyCode, RatePair, is_valid_rate};
use crate::core::error::{FxError, Result};
use crate::core::provider::{RateProvider, RateTable};
use crate::core::store::RateStore;
use futures::future::try_join;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Outcome of the non-triangulating strategies for a single pair.
#[derive(Debug)]
enum Hop {
    Found(f64),
    Miss,
    /// The provider failed and no cached fallback existed.
    ProviderFailed(FxError),
}

/// Provider response for one base currency, kept so a later hop from the
/// same base does not query the provider again.
type Fetched = Result<RateTable>;

pub struct RateResolver {
    store: Arc<dyn RateStore>,
    provider: Arc<dyn RateProvider>,
    pivot: CurrencyCode,
}

impl RateResolver {
    pub fn new(store: Arc<dyn RateStore>, provider: Arc<dyn RateProvider>) -> Self {
        Self {
            store,
            provider,
            pivot: CurrencyCode::pivot(),
        }
    }

    /// Resolves the rate to convert one unit of `from` into `to`.
    ///
    /// Persistence failures abort immediately. If every strategy misses, the
    /// provider error from the direct fetch is returned when there was one,
    /// otherwise `RateUnavailable`.
    #[instrument(name = "Resolve", skip(self), fields(from = %from, to = %to))]
    pub async fn resolve(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<f64> {
        let pair = RatePair::new(from.clone(), to.clone());

        let (hop, fetched) = self.resolve_hop(&pair, None).await?;
        let provider_error = match hop {
            Hop::Found(rate) => return Ok(rate),
            Hop::Miss => None,
            Hop::ProviderFailed(err) => Some(err),
        };

        if let Some(rate) = self.triangulate(&pair, fetched).await? {
            return Ok(rate);
        }

        debug!("All strategies exhausted for {}", pair);
        Err(provider_error.unwrap_or(FxError::RateUnavailable(pair)))
    }

    /// Runs identity, cache, fetch and reverse for one pair.
    ///
    /// `prefetched` is used instead of querying the provider when it holds a
    /// response for `pair.from`. The response used, if any, is handed back.
    async fn resolve_hop(
        &self,
        pair: &RatePair,
        prefetched: Option<Fetched>,
    ) -> Result<(Hop, Option<Fetched>)> {
        if let Some(rate) = self.identity(pair) {
            return Ok((Hop::Found(rate), prefetched));
        }
        if let Some(rate) = self.cached(pair).await? {
            return Ok((Hop::Found(rate), prefetched));
        }

        let fetched = match prefetched {
            Some(fetched) => fetched,
            None => self.fetch(&pair.from).await,
        };
        let provider_error = match self.apply_fetched(pair, &fetched).await? {
            Ok(Some(rate)) => return Ok((Hop::Found(rate), Some(fetched))),
            Ok(None) => None,
            Err(err) => Some(err),
        };

        if let Some(rate) = self.inverted(pair).await? {
            return Ok((Hop::Found(rate), Some(fetched)));
        }

        let hop = provider_error.map_or(Hop::Miss, Hop::ProviderFailed);
        Ok((hop, Some(fetched)))
    }

    fn identity(&self, pair: &RatePair) -> Option<f64> {
        pair.is_identity().then_some(1.0)
    }

    async fn cached(&self, pair: &RatePair) -> Result<Option<f64>> {
        Ok(self.store.get(pair).await?.map(|entry| entry.rate))
    }

    async fn fetch(&self, base: &CurrencyCode) -> Fetched {
        let fetched = self.provider.fetch_rates_for(base).await;
        if let Err(err) = &fetched {
            debug!(error = %err, "Fetch failed for base {}", base);
        }
        fetched
    }

    /// Picks the rate for `pair` out of a response quoted against `pair.from`
    /// and caches the whole response in one write.
    ///
    /// The outer result carries persistence failures, the inner one provider
    /// failures so the caller can fall back to other strategies.
    async fn apply_fetched(
        &self,
        pair: &RatePair,
        fetched: &Fetched,
    ) -> Result<Result<Option<f64>>> {
        let rates = match fetched {
            Ok(rates) => rates,
            Err(err) => return Ok(Err(err.clone())),
        };

        let Some(&rate) = rates.get(&pair.to) else {
            debug!("Response for {} has no rate for {}", pair.from, pair.to);
            return Ok(Ok(None));
        };
        if !is_valid_rate(rate) {
            return Ok(Err(FxError::ProviderDataInvalid(format!(
                "Non-positive rate {rate} for {pair}"
            ))));
        }

        let mut batch = vec![(pair.clone(), rate)];
        for (code, &other) in rates {
            if code == &pair.to || code == &pair.from {
                continue;
            }
            if !is_valid_rate(other) {
                debug!("Skipping invalid rate {} for {}/{}", other, pair.from, code);
                continue;
            }
            batch.push((RatePair::new(pair.from.clone(), code.clone()), other));
        }
        self.store.put_many(&batch).await?;
        Ok(Ok(Some(rate)))
    }

    async fn inverted(&self, pair: &RatePair) -> Result<Option<f64>> {
        let Some(entry) = self.store.get(&pair.inverse()).await? else {
            return Ok(None);
        };
        let rate = 1.0 / entry.rate;
        if !is_valid_rate(rate) {
            debug!(reverse = entry.rate, "Reverse rate for {} does not invert", pair);
            return Ok(None);
        }
        Ok(Some(rate))
    }

    async fn triangulate(
        &self,
        pair: &RatePair,
        fetched: Option<Fetched>,
    ) -> Result<Option<f64>> {
        if pair.from == self.pivot || pair.to == self.pivot {
            return Ok(None);
        }

        // The first hop shares its base with the direct fetch already made.
        let first = RatePair::new(pair.from.clone(), self.pivot.clone());
        let second = RatePair::new(self.pivot.clone(), pair.to.clone());
        let ((first_hop, _), (second_hop, _)) = try_join(
            self.resolve_hop(&first, fetched),
            self.resolve_hop(&second, None),
        )
        .await?;

        let (Hop::Found(first_rate), Hop::Found(second_rate)) = (first_hop, second_hop) else {
            debug!("Triangulation via {} failed for {}", self.pivot, pair);
            return Ok(None);
        };

        let rate = first_rate * second_rate;
        if !is_valid_rate(rate) {
            debug!(
                first_rate,
                second_rate, "Triangulated rate for {} is out of range", pair
            );
            return Ok(None);
        }
        self.store.put(pair, rate).await?;
        debug!(rate, "Triangulated {} via {}", pair, self.pivot);
        Ok(Some(rate))
    }
}
