//! Currency codes, monetary amounts and fiat classification

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Currencies the quote provider prices against but never quotes directly.
pub const FIAT_CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "AUD", "CAD", "CHF", "CNY", "KRW", "RUB", "BRL", "INR",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("currency code cannot be empty")]
    EmptyCurrencyCode,
    #[error("invalid character {ch:?} in currency code {code:?}")]
    InvalidCurrencyCode { code: String, ch: char },
    #[error("amount cannot be negative: {0}")]
    NegativeAmount(f64),
    #[error("amount must be a finite number: {0}")]
    NonFiniteAmount(f64),
    #[error("invalid amount format: {0}")]
    InvalidAmount(String),
}

/// Normalized, uppercase currency identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(ValidationError::EmptyCurrencyCode);
        }

        if let Some(ch) = normalized.chars().find(|ch| !ch.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidCurrencyCode {
                code: normalized,
                ch,
            });
        }

        Ok(Self(normalized))
    }

    /// For codes known at compile time to be well formed.
    pub(crate) fn from_static(code: &'static str) -> Self {
        Self(code.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_fiat(&self) -> bool {
        is_fiat(&self.0)
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Returns true when `code` names one of the known fiat currencies.
/// Anything else is treated as a crypto asset.
pub fn is_fiat(code: &str) -> bool {
    let code = code.trim();
    FIAT_CURRENCIES
        .iter()
        .any(|fiat| fiat.eq_ignore_ascii_case(code))
}

/// An amount of a single currency. The amount is always finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    currency: CurrencyCode,
    amount: f64,
}

impl Money {
    pub fn new(currency: CurrencyCode, amount: f64) -> Result<Self, ValidationError> {
        if !amount.is_finite() {
            return Err(ValidationError::NonFiniteAmount(amount));
        }
        if amount < 0.0 {
            return Err(ValidationError::NegativeAmount(amount));
        }

        Ok(Self { currency, amount })
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.8} {}", self.amount, self.currency)
    }
}

/// Parses a user supplied amount. Sign and range checks happen in [`Money::new`].
pub fn parse_amount(input: &str) -> Result<f64, ValidationError> {
    let trimmed = input.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidAmount(trimmed.to_string()))
}
