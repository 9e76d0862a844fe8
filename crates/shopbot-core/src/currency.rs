//! Static currency conversion table.
//!
//! Rates are approximate USD values per unit and are not refreshed at
//! runtime. Unknown codes are rejected rather than converted 1:1.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("unsupported currency code: {0}")]
    Unsupported(String),
}

/// USD value of one unit of each supported currency.
pub(crate) const RATES_TO_USD: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 1.08),
    ("GBP", 1.27),
    ("CAD", 0.73),
    ("AUD", 0.66),
    ("NZD", 0.61),
    ("CHF", 1.13),
    ("JPY", 0.0067),
    ("CNY", 0.14),
    ("HKD", 0.128),
    ("SGD", 0.74),
    ("KRW", 0.000_75),
    ("INR", 0.012),
    ("MXN", 0.058),
    ("BRL", 0.18),
    ("COP", 0.000_25),
    ("CLP", 0.0011),
    ("ARS", 0.0011),
    ("PEN", 0.27),
    ("SEK", 0.095),
    ("NOK", 0.094),
    ("DKK", 0.145),
    ("PLN", 0.25),
    ("CZK", 0.043),
    ("ZAR", 0.055),
];

/// Looks up the USD rate for a currency code (case-insensitive).
#[must_use]
pub fn rate_to_usd(code: &str) -> Option<f64> {
    let code = code.trim().to_ascii_uppercase();
    RATES_TO_USD
        .iter()
        .find(|(c, _)| *c == code)
        .map(|&(_, rate)| rate)
}

#[must_use]
pub fn is_supported(code: &str) -> bool {
    rate_to_usd(code).is_some()
}

/// Converts amounts into one reference currency.
#[derive(Debug, Clone)]
pub struct CurrencyNormalizer {
    reference: String,
    reference_rate: f64,
}

impl CurrencyNormalizer {
    /// # Errors
    ///
    /// Returns [`CurrencyError::Unsupported`] if `reference` is not in the table.
    pub fn new(reference: &str) -> Result<Self, CurrencyError> {
        let reference = reference.trim().to_ascii_uppercase();
        let reference_rate =
            rate_to_usd(&reference).ok_or_else(|| CurrencyError::Unsupported(reference.clone()))?;
        Ok(Self {
            reference,
            reference_rate,
        })
    }

    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Converts `amount` in `currency_code` into the reference currency.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::Unsupported`] for codes missing from the table.
    pub fn to_reference(&self, amount: f64, currency_code: &str) -> Result<f64, CurrencyError> {
        let rate = rate_to_usd(currency_code)
            .ok_or_else(|| CurrencyError::Unsupported(currency_code.trim().to_string()))?;
        Ok(amount * rate / self.reference_rate)
    }
}
