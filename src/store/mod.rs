pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::currency::{ConversionRecord, RatePair, is_valid_rate};
use crate::core::error::{FxError, Result};
use disk::FjallRateStore;

pub use memory::MemoryRateStore;

/// Opens the durable rate store under the configured data directory.
pub fn open_store(config: &AppConfig) -> Result<FjallRateStore> {
    let data_path = config
        .data_path()
        .map_err(|e| FxError::PersistenceFailure(e.to_string()))?;
    FjallRateStore::open(&data_path.join("db"))
}

/// Non-finite floats cannot round-trip through the JSON encoding, so they never reach a store.
pub(crate) fn ensure_storable_rate(pair: &RatePair, rate: f64) -> Result<()> {
    if !is_valid_rate(rate) {
        return Err(FxError::PersistenceFailure(format!(
            "Refusing to store rate {rate} for {pair}"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_storable_record(record: &ConversionRecord) -> Result<()> {
    let values = [record.amount, record.rate, record.result];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(FxError::PersistenceFailure(format!(
            "Refusing to record non-finite conversion of {} {}",
            record.amount, record.pair
        )));
    }
    Ok(())
}
