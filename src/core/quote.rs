//! Market quote abstractions and core types

use crate::core::currency::CurrencyCode;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Price of one asset denominated in one reference currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub volume_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub percent_change_24h: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Quote {
    pub fn with_price(price: f64) -> Self {
        Self {
            price,
            volume_24h: None,
            market_cap: None,
            percent_change_24h: None,
            last_updated: None,
        }
    }
}

/// Quotes returned by a single provider call, keyed by symbol and then by
/// reference currency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSet {
    data: HashMap<String, HashMap<String, Quote>>,
}

impl QuoteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, reference: &str, quote: Quote) {
        self.data
            .entry(symbol.to_ascii_uppercase())
            .or_default()
            .insert(reference.to_ascii_uppercase(), quote);
    }

    /// Records that the provider returned `symbol`, even without usable quotes.
    pub fn insert_symbol(&mut self, symbol: &str) {
        self.data.entry(symbol.to_ascii_uppercase()).or_default();
    }

    /// Builder style variant of [`QuoteSet::insert`] that only carries a price.
    pub fn with_price(mut self, symbol: &str, reference: &str, price: f64) -> Self {
        self.insert(symbol, reference, Quote::with_price(price));
        self
    }

    /// All reference currency quotes for `symbol`, if the provider returned it.
    pub fn quotes_for(&self, symbol: &CurrencyCode) -> Option<&HashMap<String, Quote>> {
        self.data.get(symbol.as_str())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetches the latest quotes of `symbols` priced in `reference` with a
    /// single upstream request.
    async fn fetch_quotes(
        &self,
        symbols: &[CurrencyCode],
        reference: &CurrencyCode,
    ) -> Result<QuoteSet>;
}
