//! Persistence for the latest known rates.

pub mod memory;
pub mod sqlite;

use crate::core::rates::{NewRateRecord, RateRecord};
use thiserror::Error;

pub use memory::MemoryRateStore;
pub use sqlite::SqliteRateStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Rate store unavailable: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Rate store unavailable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rate store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid rate record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Contract for the rate table.
///
/// The table is only ever written through [`RateStore::replace_all`], so a reader sees
/// either the previous full set of rates or the new one, never a mix.
pub trait RateStore: Send + Sync {
    /// Creates the table if it does not exist yet. Idempotent.
    fn ensure_schema(&self) -> Result<()>;

    /// Deletes every stored rate and inserts `records` in one transaction.
    fn replace_all(&self, records: &[NewRateRecord]) -> Result<()>;

    /// Latest record for a canonical (uppercase) currency code.
    fn find_by_code(&self, code: &str) -> Result<Option<RateRecord>>;

    fn any(&self) -> Result<bool>;

    fn count(&self) -> Result<usize>;

    /// Every stored record, ordered by currency code.
    fn all(&self) -> Result<Vec<RateRecord>>;
}

pub(crate) fn validate_records(records: &[NewRateRecord]) -> Result<()> {
    for record in records {
        if record.currency_code.trim().is_empty() {
            return Err(StoreError::InvalidRecord("empty currency code".to_string()));
        }
        if !record.exchange_rate.is_finite() || record.exchange_rate < 0.0 {
            return Err(StoreError::InvalidRecord(format!(
                "{} has rate {}",
                record.currency_code, record.exchange_rate
            )));
        }
    }
    Ok(())
}
