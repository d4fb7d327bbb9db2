//! Cross rate derivation from quotes priced in a common reference currency.

use crate::core::currency::CurrencyCode;
use crate::core::quote::{QuoteProvider, QuoteSet};
use anyhow::{Context, Result};
use thiserror::Error;
use tracing::debug;

/// Reference currency used when neither side of the pair is fiat.
pub const CRYPTO_REFERENCE: &str = "USD";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("fiat to fiat conversion is not supported: {from} -> {to}")]
    UnsupportedPair { from: CurrencyCode, to: CurrencyCode },
    #[error("no data found for currency {symbol}")]
    MissingSymbol { symbol: CurrencyCode },
    #[error("no quote found for {symbol} in {reference}")]
    MissingQuote {
        symbol: CurrencyCode,
        reference: CurrencyCode,
    },
    #[error("invalid price {price} for {symbol} in {reference}")]
    InvalidPrice {
        symbol: CurrencyCode,
        reference: CurrencyCode,
        price: f64,
    },
}

/// Symbols to fetch and the currency they must be priced in.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub symbols: Vec<CurrencyCode>,
    pub reference: CurrencyCode,
}

/// Decides which quotes are needed to price `from` in `to`.
///
/// Returns `Ok(None)` for identical currencies, which need no quotes at all.
pub fn quote_request(
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Result<Option<QuoteRequest>, RateError> {
    if from == to {
        return Ok(None);
    }

    let request = match (from.is_fiat(), to.is_fiat()) {
        (true, true) => {
            return Err(RateError::UnsupportedPair {
                from: from.clone(),
                to: to.clone(),
            });
        }
        (_, true) => QuoteRequest {
            symbols: vec![from.clone()],
            reference: to.clone(),
        },
        (true, false) => QuoteRequest {
            symbols: vec![to.clone()],
            reference: from.clone(),
        },
        (false, false) => QuoteRequest {
            symbols: vec![from.clone(), to.clone()],
            reference: CurrencyCode::from_static(CRYPTO_REFERENCE),
        },
    };

    Ok(Some(request))
}

/// Derives the number of `to` units one unit of `from` buys.
///
/// `quotes` must be priced in the reference chosen by [`quote_request`].
pub fn compute_rate(
    from: &CurrencyCode,
    to: &CurrencyCode,
    quotes: &QuoteSet,
) -> Result<f64, RateError> {
    let Some(request) = quote_request(from, to)? else {
        return Ok(1.0);
    };
    let reference = &request.reference;

    match (from.is_fiat(), to.is_fiat()) {
        (false, true) => price_of(quotes, from, reference),
        (true, false) => Ok(1.0 / price_of(quotes, to, reference)?),
        _ => {
            let from_price = price_of(quotes, from, reference)?;
            let to_price = price_of(quotes, to, reference)?;
            Ok(from_price / to_price)
        }
    }
}

/// Fetches the quotes a pair needs from `provider` and derives the rate.
///
/// Identity and fiat-to-fiat pairs are settled without calling the provider.
pub async fn fetch_rate(
    provider: &dyn QuoteProvider,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Result<f64> {
    debug!(%from, %to, "Getting exchange rate");

    let Some(request) = quote_request(from, to)? else {
        debug!("Same currency conversion, returning rate 1.0");
        return Ok(1.0);
    };

    let quotes = provider
        .fetch_quotes(&request.symbols, &request.reference)
        .await
        .context("Failed to get quotes")?;
    debug!(count = quotes.len(), "Received quotes");

    Ok(compute_rate(from, to, &quotes)?)
}

fn price_of(
    quotes: &QuoteSet,
    symbol: &CurrencyCode,
    reference: &CurrencyCode,
) -> Result<f64, RateError> {
    let entry = quotes
        .quotes_for(symbol)
        .ok_or_else(|| RateError::MissingSymbol {
            symbol: symbol.clone(),
        })?;
    let quote = entry
        .get(reference.as_str())
        .ok_or_else(|| RateError::MissingQuote {
            symbol: symbol.clone(),
            reference: reference.clone(),
        })?;

    // Zero would turn into an infinite rate, NaN would propagate silently.
    if !quote.price.is_finite() || quote.price == 0.0 {
        return Err(RateError::InvalidPrice {
            symbol: symbol.clone(),
            reference: reference.clone(),
            price: quote.price,
        });
    }

    Ok(quote.price)
}
