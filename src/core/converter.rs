//! Entry points used by the user interface.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::cache::SnapshotCache;
use super::conversion::{ConversionError, ConversionRequest, ConversionResult, try_parse_amount};
use super::currency::Currency;
use super::lookup::{RateLookup, RateSource};
use super::rates::RateProvider;
use super::refresh::{RefreshHandle, RefreshOrchestrator, RefreshStatus, spawn_refresh_with};
use crate::store::RateStore;

/// Placeholder shown by a currency picker with nothing selected.
pub const NO_SELECTION: &str = "--SELECT--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("Please enter the amount")]
    MissingAmount,
    #[error("'{0}' is not a valid amount")]
    InvalidAmount(String),
    #[error("Please select both currencies")]
    CurrencyNotSelected,
    #[error("Unsupported currency: {0}")]
    UnknownCurrency(String),
    #[error("Unable to get exchange rates")]
    RatesUnavailable,
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl ConvertError {
    /// Input problems are informational prompts, the rest are errors.
    pub fn severity(&self) -> Severity {
        match self {
            ConvertError::MissingAmount
            | ConvertError::InvalidAmount(_)
            | ConvertError::CurrencyNotSelected
            | ConvertError::UnknownCurrency(_) => Severity::Info,
            ConvertError::RatesUnavailable | ConvertError::Conversion(_) => Severity::Error,
        }
    }
}

fn selected(code: Option<&str>) -> Option<&str> {
    code.map(str::trim)
        .filter(|c| !c.is_empty() && *c != NO_SELECTION)
}

/// Checks the raw form input and turns it into a [`ConversionRequest`].
pub fn validate_input(
    amount_text: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<ConversionRequest, ConvertError> {
    if amount_text.trim().is_empty() {
        return Err(ConvertError::MissingAmount);
    }
    let (Some(from), Some(to)) = (selected(from), selected(to)) else {
        return Err(ConvertError::CurrencyNotSelected);
    };
    let amount = try_parse_amount(amount_text)
        .ok_or_else(|| ConvertError::InvalidAmount(amount_text.trim().to_string()))?;
    let parse = |code: &str| {
        code.parse::<Currency>()
            .map_err(|_| ConvertError::UnknownCurrency(code.to_string()))
    };

    Ok(ConversionRequest {
        amount,
        from: parse(from)?,
        to: parse(to)?,
    })
}

/// Ties the rate lookup, the refresh and the conversion arithmetic together.
pub struct Converter {
    store: Arc<dyn RateStore>,
    lookup: RateLookup,
    orchestrator: Arc<RefreshOrchestrator>,
}

impl Converter {
    pub fn new(store: Arc<dyn RateStore>, provider: Arc<dyn RateProvider>, base: Currency) -> Self {
        let snapshot = SnapshotCache::new();
        let lookup = RateLookup::new(Arc::clone(&store), snapshot.clone(), base);
        let orchestrator = Arc::new(RefreshOrchestrator::new(
            provider,
            Arc::clone(&store),
            snapshot,
        ));
        Self {
            store,
            lookup,
            orchestrator,
        }
    }

    pub fn store(&self) -> &Arc<dyn RateStore> {
        &self.store
    }

    pub fn lookup(&self) -> &RateLookup {
        &self.lookup
    }

    pub fn orchestrator(&self) -> &Arc<RefreshOrchestrator> {
        &self.orchestrator
    }

    /// Converts the raw form input into the result text.
    pub fn convert(
        &self,
        amount_text: &str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<String, ConvertError> {
        let request = validate_input(amount_text, from, to)?;
        Ok(self.convert_request(&request)?.to_string())
    }

    pub fn convert_request(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ConvertError> {
        let from = self.lookup.lookup(request.from.as_str());
        let to = self.lookup.lookup(request.to.as_str());

        if !from.is_available() || !to.is_available() {
            debug!(?from, ?to, "Missing rate for conversion");
            return Err(ConvertError::RatesUnavailable);
        }
        if from.source == RateSource::Snapshot || to.source == RateSource::Snapshot {
            warn!("Converting with cached rates, the rate store could not be read");
        }

        Ok(request.apply(from.rate, to.rate)?)
    }

    /// Starts a background refresh of the rates.
    pub fn refresh_rates(&self) -> RefreshHandle {
        self.refresh_rates_with(|_| {})
    }

    pub fn refresh_rates_with<F>(&self, on_complete: F) -> RefreshHandle
    where
        F: FnOnce(&RefreshStatus) + Send + 'static,
    {
        spawn_refresh_with(Arc::clone(&self.orchestrator), on_complete)
    }
}

/// Input state of the conversion form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConverterForm {
    pub amount: String,
    pub from: Option<Currency>,
    pub to: Option<Currency>,
    pub result: String,
}

impl ConverterForm {
    pub fn clear_inputs(&mut self) {
        *self = Self::default();
    }

    /// Converts the current input. On failure the form is left as it was.
    pub fn submit(&mut self, converter: &Converter) -> Result<&str, ConvertError> {
        let text = converter.convert(
            &self.amount,
            self.from.map(|c| c.as_str()),
            self.to.map(|c| c.as_str()),
        )?;
        self.result = text;
        Ok(&self.result)
    }
}
