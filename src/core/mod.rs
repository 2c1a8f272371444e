//! Core business logic: rates, conversion and the refresh pipeline

pub mod cache;
pub mod config;
pub mod conversion;
pub mod converter;
pub mod currency;
pub mod log;
pub mod lookup;
pub mod rates;
pub mod refresh;

// Re-export main types for cleaner imports
pub use conversion::{ConversionError, calculate_converted_amount, format_result, try_parse_amount};
pub use converter::{ConvertError, Converter, ConverterForm, Severity};
pub use currency::Currency;
pub use lookup::{RateLookup, RateQuote, RateSource};
pub use rates::{RateProvider, RateRecord, RateSnapshot};
pub use refresh::{RefreshHandle, RefreshOrchestrator, RefreshState, RefreshStatus};
