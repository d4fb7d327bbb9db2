use crate::core::currency::CurrencyCode;
use crate::core::quote::{QuoteProvider, QuoteSet};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

type RecordedRequest = (Vec<CurrencyCode>, CurrencyCode);

/// Serves a fixed snapshot of quotes from memory and records what was asked.
pub struct FixedQuoteProvider {
    quotes: QuoteSet,
    failure: Option<String>,
    delay: Option<Duration>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FixedQuoteProvider {
    pub fn new(quotes: QuoteSet) -> Self {
        Self {
            quotes,
            failure: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(QuoteSet::new())
        }
    }

    /// Makes every call wait `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QuoteProvider for FixedQuoteProvider {
    async fn fetch_quotes(
        &self,
        symbols: &[CurrencyCode],
        reference: &CurrencyCode,
    ) -> Result<QuoteSet> {
        if symbols.is_empty() {
            bail!("At least one symbol is required");
        }

        self.requests
            .lock()
            .map_err(|_| anyhow!("Request log poisoned"))?
            .push((symbols.to_vec(), reference.clone()));
        debug!(?symbols, %reference, "Serving fixed quotes");

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.failure {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(self.quotes.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_empty_symbols() {
        let provider = FixedQuoteProvider::new(QuoteSet::new());
        let usd = CurrencyCode::parse("USD").unwrap();

        let result = provider.fetch_quotes(&[], &usd).await;
        assert!(result.is_err());
        assert_eq!(provider.calls(), 0);
    }
}
