//! Currency codes, directional pairs and the records built from them.

use crate::core::error::{FxError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Intermediate currency used to bridge pairs with no direct rate.
pub const PIVOT_CURRENCY: &str = "USD";

const CODE_LEN: usize = 3;

/// A three letter, uppercase currency code such as `USD`.
///
/// Codes are not checked against an ISO list; any well-formed code is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: &str) -> Result<Self> {
        let normalized = code.trim().to_ascii_uppercase();
        if normalized.len() != CODE_LEN || !normalized.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(FxError::InvalidCurrencyCode(code.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn pivot() -> Self {
        Self(PIVOT_CURRENCY.to_string())
    }

    pub fn is_pivot(&self) -> bool {
        self.0 == PIVOT_CURRENCY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = FxError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered (from, to) pair. `(A, B)` and `(B, A)` are distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RatePair {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl RatePair {
    pub fn new(from: CurrencyCode, to: CurrencyCode) -> Self {
        Self { from, to }
    }

    pub fn parse(from: &str, to: &str) -> Result<Self> {
        Ok(Self::new(from.parse()?, to.parse()?))
    }

    pub fn inverse(&self) -> Self {
        Self::new(self.to.clone(), self.from.clone())
    }

    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    /// Key under which the pair is persisted, e.g. `USD_EUR`.
    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.from, self.to)
    }
}

impl fmt::Display for RatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

/// A cached rate for a pair along with when it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub pair: RatePair,
    pub rate: f64,
    pub observed_at: DateTime<Utc>,
}

/// One completed conversion. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub amount: f64,
    pub pair: RatePair,
    pub rate: f64,
    pub result: f64,
    pub timestamp: DateTime<Utc>,
}

/// Rates must be finite and strictly positive to be usable.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}
