//! Core business logic abstractions

pub mod config;
pub mod context;
pub mod conversion;
pub mod currency;
pub mod error;
pub mod log;
pub mod provider;
pub mod resolver;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for cleaner imports
pub use context::FxContext;
pub use conversion::ConversionService;
pub use currency::{ConversionRecord, CurrencyCode, RateEntry, RatePair};
pub use error::FxError;
pub use provider::RateProvider;
pub use resolver::RateResolver;
pub use store::RateStore;
