use super::{RateStore, Result, StoreError, validate_records};
use crate::core::rates::{NewRateRecord, RateRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

#[derive(Default)]
struct Table {
    rows: Vec<RateRecord>,
    next_id: i64,
}

/// In-memory rate table, used when no database file is wanted.
///
/// It can be switched into a failing mode to stand in for an unreachable database.
#[derive(Default)]
pub struct MemoryRateStore {
    inner: RwLock<Table>,
    failing: AtomicBool,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following operation fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

impl RateStore for MemoryRateStore {
    fn ensure_schema(&self) -> Result<()> {
        self.check_available()
    }

    fn replace_all(&self, records: &[NewRateRecord]) -> Result<()> {
        self.check_available()?;
        validate_records(records)?;

        let mut table = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        table.rows.clear();
        for record in records {
            table.next_id += 1;
            let id = table.next_id;
            table.rows.push(RateRecord {
                id,
                currency_code: record.currency_code.clone(),
                exchange_rate: record.exchange_rate,
                timestamp: record.timestamp,
            });
        }
        debug!("Memory store REPLACE with {} rates", records.len());
        Ok(())
    }

    fn find_by_code(&self, code: &str) -> Result<Option<RateRecord>> {
        self.check_available()?;
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table
            .rows
            .iter()
            .rev()
            .find(|r| r.currency_code == code)
            .cloned())
    }

    fn any(&self) -> Result<bool> {
        self.check_available()?;
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(!table.rows.is_empty())
    }

    fn count(&self) -> Result<usize> {
        self.check_available()?;
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table.rows.len())
    }

    fn all(&self) -> Result<Vec<RateRecord>> {
        self.check_available()?;
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows = table.rows.clone();
        rows.sort_by(|a, b| a.currency_code.cmp(&b.currency_code).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}
