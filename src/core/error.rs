//! Error types for rate resolution and conversion.

use crate::core::currency::RatePair;
use thiserror::Error;

pub type Result<T, E = FxError> = std::result::Result<T, E>;

/// Failures surfaced by the conversion core.
///
/// Every variant is returned to the caller; nothing is retried internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Invalid history limit: {0}")]
    InvalidLimit(usize),

    #[error("Rate provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Rate provider returned invalid data: {0}")]
    ProviderDataInvalid(String),

    #[error("No exchange rate available for {0}")]
    RateUnavailable(RatePair),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl FxError {
    /// Returns true if the same request may succeed when retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FxError::ProviderUnavailable(_))
    }
}

impl From<fjall::Error> for FxError {
    fn from(err: fjall::Error) -> Self {
        FxError::PersistenceFailure(err.to_string())
    }
}
