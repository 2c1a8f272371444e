//! Supported currencies

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// The closed set of currencies the converter knows rates for.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    PLN,
    GBP,
    INR,
    JPY,
    NZD,
    CAD,
    ISK,
    PHP,
    DKK,
    CZK,
}

impl Currency {
    /// Reference currency of the provider. Its rate is `1.0` when nothing else is known.
    pub const BASE: Currency = Currency::USD;

    pub const ALL: [Currency; 12] = [
        Currency::USD,
        Currency::EUR,
        Currency::PLN,
        Currency::GBP,
        Currency::INR,
        Currency::JPY,
        Currency::NZD,
        Currency::CAD,
        Currency::ISK,
        Currency::PHP,
        Currency::DKK,
        Currency::CZK,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::PLN => "PLN",
            Currency::GBP => "GBP",
            Currency::INR => "INR",
            Currency::JPY => "JPY",
            Currency::NZD => "NZD",
            Currency::CAD => "CAD",
            Currency::ISK => "ISK",
            Currency::PHP => "PHP",
            Currency::DKK => "DKK",
            Currency::CZK => "CZK",
        }
    }

    /// Exact match on the canonical uppercase code.
    pub fn from_code(code: &str) -> Option<Currency> {
        Currency::ALL.into_iter().find(|c| c.as_str() == code)
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::from_code(&s.trim().to_uppercase())
            .ok_or_else(|| anyhow::anyhow!("Unsupported currency: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_from_code() {
        for currency in Currency::ALL {
            assert_eq!(Currency::from_code(currency.as_str()), Some(currency));
        }
    }

    #[test]
    fn test_from_code_is_case_sensitive() {
        assert_eq!(Currency::from_code("EUR"), Some(Currency::EUR));
        assert_eq!(Currency::from_code("eur"), None);
        assert_eq!(Currency::from_code("XXX"), None);
    }

    #[test]
    fn test_from_str_accepts_user_input() {
        assert_eq!(" pln ".parse::<Currency>().unwrap(), Currency::PLN);
        assert_eq!("Jpy".parse::<Currency>().unwrap(), Currency::JPY);

        let err = "BTC".parse::<Currency>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported currency: BTC");
    }

    #[test]
    fn test_base_is_usd() {
        assert_eq!(Currency::BASE.to_string(), "USD");
    }
}
