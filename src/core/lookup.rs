use std::sync::Arc;
use tracing::{debug, warn};

use super::cache::SnapshotCache;
use super::currency::Currency;
use crate::store::{self, RateStore};

/// Where a looked up rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Store,
    /// The store could not be read, the last fetched snapshot was used instead.
    Snapshot,
    /// Nothing was known, the base currency defaults to `1.0`.
    BaseDefault,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuote {
    pub rate: f64,
    pub source: RateSource,
}

impl RateQuote {
    /// A rate of zero is the "no data" sentinel.
    pub fn is_available(&self) -> bool {
        self.rate > 0.0
    }
}

/// Resolves rates from the store, falling back to the in-memory snapshot.
pub struct RateLookup {
    store: Arc<dyn RateStore>,
    snapshot: SnapshotCache,
    base: Currency,
}

impl RateLookup {
    pub fn new(store: Arc<dyn RateStore>, snapshot: SnapshotCache, base: Currency) -> Self {
        Self {
            store,
            snapshot,
            base,
        }
    }

    pub fn base(&self) -> Currency {
        self.base
    }

    /// Latest rate for `code`, `0.0` when no source knows it.
    pub fn get_rate(&self, code: &str) -> f64 {
        self.lookup(code).rate
    }

    pub fn lookup(&self, code: &str) -> RateQuote {
        let stored = self
            .store
            .find_by_code(code)
            .map(|record| record.map(|r| r.exchange_rate));
        if let Err(e) = &stored {
            warn!(code, error = %e, "Rate store unavailable, falling back to cached snapshot");
        }

        let quote = resolve_rate(stored, || self.snapshot.rate(code), code == self.base.as_str());
        debug!(code, rate = quote.rate, source = ?quote.source, "Resolved rate");
        quote
    }
}

/// The store wins whenever it can be read, even if it has no record for the code.
/// The snapshot is only consulted when reading the store failed.
fn resolve_rate(
    stored: store::Result<Option<f64>>,
    snapshot: impl FnOnce() -> Option<f64>,
    is_base: bool,
) -> RateQuote {
    let found = match stored {
        Ok(Some(rate)) => Some((rate, RateSource::Store)),
        Ok(None) => None,
        Err(_) => snapshot().map(|rate| (rate, RateSource::Snapshot)),
    };

    match found {
        Some((rate, source)) => RateQuote { rate, source },
        None if is_base => RateQuote {
            rate: 1.0,
            source: RateSource::BaseDefault,
        },
        None => RateQuote {
            rate: 0.0,
            source: RateSource::Unavailable,
        },
    }
}
