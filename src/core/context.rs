//! Explicit wiring of configuration, store and provider.

use crate::core::config::AppConfig;
use crate::core::conversion::ConversionService;
use crate::core::error::Result;
use crate::core::provider::RateProvider;
use crate::core::resolver::RateResolver;
use crate::core::store::RateStore;
use crate::providers::exchangerate_api::ExchangeRateApiProvider;
use crate::store::open_store;
use std::sync::Arc;

/// Everything a conversion needs, built once per process and passed around.
pub struct FxContext {
    pub config: AppConfig,
    pub store: Arc<dyn RateStore>,
    pub provider: Arc<dyn RateProvider>,
}

impl FxContext {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn RateStore>,
        provider: Arc<dyn RateProvider>,
    ) -> Self {
        Self {
            config,
            store,
            provider,
        }
    }

    /// Opens the on-disk store and HTTP provider described by `config`.
    pub fn open(config: AppConfig) -> Result<Self> {
        let store = Arc::new(open_store(&config)?);
        let provider = Arc::new(ExchangeRateApiProvider::from_config(
            &config.providers.exchangerate_api,
        )?);
        Ok(Self::new(config, store, provider))
    }

    pub fn conversion_service(&self) -> ConversionService {
        let resolver = RateResolver::new(Arc::clone(&self.store), Arc::clone(&self.provider));
        ConversionService::new(
            resolver,
            Arc::clone(&self.store),
            self.config.currencies.clone(),
        )
    }
}
