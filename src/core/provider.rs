//! Remote exchange rate source abstraction

use crate::core::currency::CurrencyCode;
use crate::core::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Rates quoted against a single base currency, keyed by target currency.
pub type RateTable = HashMap<CurrencyCode, f64>;

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches every rate quoted against `base` in a single request.
    ///
    /// Network errors, timeouts and non-success responses are reported as
    /// `ProviderUnavailable`; undecodable payloads as `ProviderDataInvalid`.
    async fn fetch_rates_for(&self, base: &CurrencyCode) -> Result<RateTable>;
}
