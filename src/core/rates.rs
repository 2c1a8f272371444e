//! Rate data shared between the provider, the store and the lookup.

use super::currency::Currency;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source of the latest rate table.
///
/// Implementations never fail: anything that goes wrong is reported as
/// [`RateSnapshot::empty`].
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_latest(&self) -> RateSnapshot;
}

/// Rates for every supported currency, relative to the provider's base.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub USD: f64,
    pub EUR: f64,
    pub PLN: f64,
    pub GBP: f64,
    pub INR: f64,
    pub JPY: f64,
    pub NZD: f64,
    pub CAD: f64,
    pub ISK: f64,
    pub PHP: f64,
    pub DKK: f64,
    pub CZK: f64,
}

impl RateTable {
    pub fn get(&self, currency: Currency) -> f64 {
        match currency {
            Currency::USD => self.USD,
            Currency::EUR => self.EUR,
            Currency::PLN => self.PLN,
            Currency::GBP => self.GBP,
            Currency::INR => self.INR,
            Currency::JPY => self.JPY,
            Currency::NZD => self.NZD,
            Currency::CAD => self.CAD,
            Currency::ISK => self.ISK,
            Currency::PHP => self.PHP,
            Currency::DKK => self.DKK,
            Currency::CZK => self.CZK,
        }
    }

    /// Returns the first currency whose rate is negative or not finite.
    pub fn find_invalid(&self) -> Option<Currency> {
        Currency::ALL.into_iter().find(|c| {
            let rate = self.get(*c);
            !rate.is_finite() || rate < 0.0
        })
    }
}

/// One complete set of rates captured at a single fetch.
///
/// A snapshot without rates is the "got nothing" result of a failed fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSnapshot {
    pub rates: Option<RateTable>,
    pub timestamp: Option<DateTime<Utc>>,
    pub license: Option<String>,
    pub base: Option<String>,
}

impl RateSnapshot {
    pub fn new(rates: RateTable, timestamp: DateTime<Utc>, license: String) -> Self {
        Self {
            rates: Some(rates),
            timestamp: Some(timestamp),
            license: Some(license),
            base: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_none()
    }

    /// Rate for a canonical currency code, if the snapshot holds one.
    pub fn rate(&self, code: &str) -> Option<f64> {
        let currency = Currency::from_code(code)?;
        self.rates.as_ref().map(|table| table.get(currency))
    }

    /// One insert payload per supported currency, all stamped with `captured_at`.
    pub fn to_records(&self, captured_at: DateTime<Utc>) -> Vec<NewRateRecord> {
        let Some(table) = &self.rates else {
            return Vec::new();
        };
        Currency::ALL
            .into_iter()
            .map(|currency| NewRateRecord {
                currency_code: currency.as_str().to_string(),
                exchange_rate: table.get(currency),
                timestamp: captured_at,
            })
            .collect()
    }
}

/// A persisted rate row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub id: i64,
    pub currency_code: String,
    pub exchange_rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// A rate row before the store has assigned its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRateRecord {
    pub currency_code: String,
    pub exchange_rate: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn sample_table() -> RateTable {
        RateTable {
            USD: 1.0,
            EUR: 0.92,
            PLN: 4.01,
            GBP: 0.79,
            INR: 83.2,
            JPY: 151.7,
            NZD: 1.67,
            CAD: 1.36,
            ISK: 138.5,
            PHP: 56.1,
            DKK: 6.87,
            CZK: 23.2,
        }
    }

    pub fn sample_snapshot() -> RateSnapshot {
        RateSnapshot::new(sample_table(), Utc::now(), "https://example.com/license".into())
    }
}
