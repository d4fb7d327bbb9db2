//! Converts an amount between two currencies using provider quotes.

use crate::core::currency::{CurrencyCode, Money};
use crate::core::quote::QuoteProvider;
use crate::core::rate::fetch_rate;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("conversion cancelled: no exchange rate after {0:?}")]
    TimedOut(Duration),
    #[error("conversion interrupted")]
    Interrupted,
}

/// Outcome of one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub from: Money,
    pub to: Money,
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
}

pub struct Converter {
    provider: Box<dyn QuoteProvider>,
    timeout: Duration,
}

impl Converter {
    pub fn new(provider: Box<dyn QuoteProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Converts `amount` of `from` into `to`.
    ///
    /// Inputs are validated before any quote is requested.
    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<ConversionResult> {
        info!(amount, from, to, "Starting currency conversion");

        let from_code = CurrencyCode::parse(from).context("Invalid source currency")?;
        let to_code = CurrencyCode::parse(to).context("Invalid target currency")?;
        let from_money = Money::new(from_code.clone(), amount).context("Invalid source amount")?;

        let rate = tokio::time::timeout(
            self.timeout,
            fetch_rate(self.provider.as_ref(), &from_code, &to_code),
        )
        .await
        .map_err(|_| ConversionError::TimedOut(self.timeout))?
        .with_context(|| format!("Failed to get exchange rate for {from_code} -> {to_code}"))?;
        debug!(rate, "Exchange rate retrieved");

        let converted = amount * rate;
        let to_money = Money::new(to_code, converted).context("Invalid converted amount")?;

        let result = ConversionResult {
            from: from_money,
            to: to_money,
            rate,
            timestamp: Utc::now(),
        };
        info!(
            from = %result.from,
            to = %result.to,
            rate = result.rate,
            "Currency conversion completed"
        );
        Ok(result)
    }
}
