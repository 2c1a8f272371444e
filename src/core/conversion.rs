//! Pure conversion arithmetic: parsing amounts, applying rates and rendering results.

use super::currency::Currency;
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConversionError {
    /// A zero "from" rate means the rate data is corrupt, not that the input is bad.
    #[error("division by zero rate")]
    ZeroFromRate,
    #[error("conversion produced a non-finite value")]
    NonFinite,
}

/// Parses a user supplied amount with a fixed, locale-independent convention.
///
/// Accepts a dot decimal separator, an optional leading sign and exponent notation.
/// Surrounding whitespace is ignored. Returns `None` for empty or unparsable text and
/// for values that are not finite.
pub fn try_parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Computes `(to_rate / from_rate) * amount`.
pub fn calculate_converted_amount(
    amount: f64,
    from_rate: f64,
    to_rate: f64,
) -> Result<f64, ConversionError> {
    if from_rate == 0.0 {
        return Err(ConversionError::ZeroFromRate);
    }

    let converted = (to_rate / from_rate) * amount;
    if !converted.is_finite() {
        return Err(ConversionError::NonFinite);
    }
    Ok(converted)
}

/// Renders `"{amount} {from} = {converted} {to}"` with the converted value fixed to two
/// decimals, rounded half away from zero.
pub fn format_result(amount: f64, from_code: &str, converted_amount: f64, to_code: &str) -> String {
    format!(
        "{} {} = {:.2} {}",
        amount,
        from_code,
        round_to_cents(converted_amount),
        to_code
    )
}

fn round_to_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / 100.0;
    // Avoid printing "-0.00"
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// A validated conversion input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: Currency,
    pub to: Currency,
}

impl ConversionRequest {
    /// Applies the two rates to the request.
    pub fn apply(&self, from_rate: f64, to_rate: f64) -> Result<ConversionResult, ConversionError> {
        let converted_amount = calculate_converted_amount(self.amount, from_rate, to_rate)?;
        Ok(ConversionResult {
            amount: self.amount,
            from: self.from,
            converted_amount,
            to: self.to,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionResult {
    pub amount: f64,
    pub from: Currency,
    pub converted_amount: f64,
    pub to: Currency,
}

impl Display for ConversionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_result(
            self.amount,
            self.from.as_str(),
            self.converted_amount,
            self.to.as_str(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_amounts() {
        let cases = [
            ("123.45", 123.45),
            ("0", 0.0),
            ("-1.5", -1.5),
            ("+2", 2.0),
            ("1e3", 1000.0),
            ("2.5E-1", 0.25),
            ("  42  ", 42.0),
        ];
        for (input, expected) in cases {
            let parsed = try_parse_amount(input);
            assert_eq!(parsed, Some(expected), "input: {input:?}");
        }
    }

    #[test]
    fn test_parse_invalid_amounts() {
        for input in ["", "   ", "abc", "1,5", "12abc", "inf", "NaN", "1e400", "--1"] {
            assert_eq!(try_parse_amount(input), None, "input: {input:?}");
        }
    }

    #[test]
    fn test_calculate_converted_amount() {
        assert_eq!(calculate_converted_amount(100.0, 2.0, 1.0), Ok(50.0));

        let (amount, from_rate, to_rate) = (37.5, 4.31, 0.92);
        assert_eq!(
            calculate_converted_amount(amount, from_rate, to_rate),
            Ok((to_rate / from_rate) * amount)
        );
        assert_eq!(calculate_converted_amount(-10.0, 1.0, 3.0), Ok(-30.0));
    }

    #[test]
    fn test_zero_from_rate_is_a_domain_error() {
        for (amount, to_rate) in [(100.0, 1.0), (0.0, 0.0), (-5.0, 123.4)] {
            assert_eq!(
                calculate_converted_amount(amount, 0.0, to_rate),
                Err(ConversionError::ZeroFromRate)
            );
        }
        assert_eq!(
            ConversionError::ZeroFromRate.to_string(),
            "division by zero rate"
        );
    }

    #[test]
    fn test_non_finite_result_is_rejected() {
        assert_eq!(
            calculate_converted_amount(f64::MAX, 1e-300, 1.0),
            Err(ConversionError::NonFinite)
        );
    }

    #[test]
    fn test_format_result_rounds_to_two_decimals() {
        let formatted = format_result(10.0, "USD", 42.1299, "EUR");
        assert!(formatted.contains("10 USD"));
        assert!(formatted.contains("EUR"));
        assert!(formatted.contains("42.13"));
        assert_eq!(formatted, "10 USD = 42.13 EUR");
    }

    #[test]
    fn test_format_result_rounds_half_away_from_zero() {
        assert_eq!(format_result(1.0, "USD", 0.125, "EUR"), "1 USD = 0.13 EUR");
        assert_eq!(format_result(-1.0, "USD", -0.125, "EUR"), "-1 USD = -0.13 EUR");
        assert_eq!(format_result(2.5, "GBP", 1234567.0, "JPY"), "2.5 GBP = 1234567.00 JPY");
        assert_eq!(format_result(0.0, "USD", -0.001, "EUR"), "0 USD = 0.00 EUR");
    }

    #[test]
    fn test_request_apply_renders_result() {
        let request = ConversionRequest {
            amount: 100.0,
            from: Currency::USD,
            to: Currency::PLN,
        };
        let result = request.apply(1.0, 4.0).unwrap();
        assert_eq!(result.converted_amount, 400.0);
        assert_eq!(result.to_string(), "100 USD = 400.00 PLN");

        assert_eq!(request.apply(0.0, 4.0), Err(ConversionError::ZeroFromRate));
    }
}
