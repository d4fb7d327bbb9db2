use crate::core::currency::CurrencyCode;
use crate::core::quote::{Quote, QuoteProvider, QuoteSet};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, instrument};

pub const SANDBOX_URL: &str = "https://sandbox-api.coinmarketcap.com";
pub const PRODUCTION_URL: &str = "https://pro-api.coinmarketcap.com";

const API_VERSION: &str = "v1";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

pub struct CoinMarketCapProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl CoinMarketCapProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("coinconv/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(CoinMarketCapProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn quotes_url(&self, symbols: &str, reference: &str) -> Result<Url> {
        let endpoint = format!(
            "{}/{API_VERSION}/cryptocurrency/quotes/latest",
            self.base_url
        );
        Url::parse_with_params(&endpoint, &[("symbol", symbols), ("convert", reference)])
            .with_context(|| format!("Invalid quote endpoint: {endpoint}"))
    }
}

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    status: Status,
    #[serde(default)]
    data: Option<HashMap<String, Asset>>,
}

#[derive(Debug, Deserialize)]
struct Status {
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    error_code: i64,
    error_message: Option<String>,
    elapsed: Option<i64>,
    credit_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    id: Option<i64>,
    name: Option<String>,
    #[serde(default)]
    quote: HashMap<String, AssetQuote>,
}

#[derive(Debug, Deserialize)]
struct AssetQuote {
    price: Option<f64>,
    volume_24h: Option<f64>,
    percent_change_24h: Option<f64>,
    market_cap: Option<f64>,
    last_updated: Option<DateTime<Utc>>,
}

impl QuotesResponse {
    fn into_quote_set(self) -> QuoteSet {
        let mut quotes = QuoteSet::new();
        for (symbol, asset) in self.data.unwrap_or_default() {
            debug!(%symbol, id = ?asset.id, name = ?asset.name, "Received asset");
            quotes.insert_symbol(&symbol);
            for (reference, quote) in asset.quote {
                // An unpriced entry is as good as a missing one.
                let Some(price) = quote.price else {
                    continue;
                };
                quotes.insert(
                    &symbol,
                    &reference,
                    Quote {
                        price,
                        volume_24h: quote.volume_24h,
                        market_cap: quote.market_cap,
                        percent_change_24h: quote.percent_change_24h,
                        last_updated: quote.last_updated,
                    },
                );
            }
        }
        quotes
    }
}

#[async_trait]
impl QuoteProvider for CoinMarketCapProvider {
    #[instrument(
        name = "CoinMarketCapQuotes",
        skip_all,
        fields(symbols = ?symbols, reference = %reference)
    )]
    async fn fetch_quotes(
        &self,
        symbols: &[CurrencyCode],
        reference: &CurrencyCode,
    ) -> Result<QuoteSet> {
        if symbols.is_empty() {
            bail!("At least one symbol is required");
        }

        let symbol_list = symbols
            .iter()
            .map(CurrencyCode::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = self.quotes_url(&symbol_list, reference.as_str())?;
        debug!("Requesting quotes from {}", url);

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("Request failed for symbols: {symbol_list}"))?;

        let status = response.status();
        debug!(%status, "Received quote response");

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read quote response for {symbol_list}"))?;

        if !status.is_success() {
            error!(%status, body = %text, "Quote request failed");
            bail!("HTTP error: {} for symbols: {}: {}", status, symbol_list, text);
        }

        let data: QuotesResponse = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(e) => {
                error!(error = ?e, response = %text, "Failed to parse quote response");
                return Err(e)
                    .with_context(|| format!("Failed to parse quote response for {symbol_list}"));
            }
        };

        if data.status.error_code != 0 {
            let message = data.status.error_message.as_deref().unwrap_or_default();
            error!(
                error_code = data.status.error_code,
                error_message = message,
                "Provider returned an error"
            );
            bail!("API error {}: {}", data.status.error_code, message);
        }

        debug!(
            timestamp = ?data.status.timestamp,
            elapsed = ?data.status.elapsed,
            credit_count = ?data.status.credit_count,
            "Quote request succeeded"
        );
        Ok(data.into_quote_set())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const QUOTES_PATH: &str = "/v1/cryptocurrency/quotes/latest";
    const API_KEY: &str = "test-key";

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn provider(server: &MockServer) -> CoinMarketCapProvider {
        CoinMarketCapProvider::new(&server.uri(), API_KEY, Duration::from_secs(5)).unwrap()
    }

    async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUOTES_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    const MOCK_JSON: &str = r#"{
        "status": {
            "timestamp": "2024-05-01T10:00:00.000Z",
            "error_code": 0,
            "error_message": null,
            "elapsed": 12,
            "credit_count": 1
        },
        "data": {
            "BTC": {
                "id": 1,
                "name": "Bitcoin",
                "symbol": "BTC",
                "quote": {
                    "USD": {
                        "price": 50000.0,
                        "volume_24h": 1200000.5,
                        "percent_change_1h": 0.1,
                        "percent_change_24h": -1.5,
                        "percent_change_7d": 4.2,
                        "market_cap": 980000000000.0,
                        "last_updated": "2024-05-01T09:59:00.000Z"
                    }
                }
            },
            "ETH": {
                "id": 1027,
                "name": "Ethereum",
                "symbol": "ETH",
                "quote": {
                    "USD": { "price": 2500.0 }
                }
            }
        }
    }"#;

    #[tokio::test]
    async fn test_successful_quote_fetch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUOTES_PATH))
            .and(query_param("symbol", "BTC,ETH"))
            .and(query_param("convert", "USD"))
            .and(header(API_KEY_HEADER, API_KEY))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_JSON))
            .expect(1)
            .mount(&mock_server)
            .await;

        let quotes = provider(&mock_server)
            .fetch_quotes(&[code("BTC"), code("ETH")], &code("USD"))
            .await
            .unwrap();

        assert_eq!(quotes.len(), 2);
        let btc = quotes.quotes_for(&code("BTC")).unwrap().get("USD").unwrap();
        assert_eq!(btc.price, 50000.0);
        assert_eq!(btc.volume_24h, Some(1200000.5));
        assert_eq!(btc.percent_change_24h, Some(-1.5));
        assert_eq!(btc.market_cap, Some(980000000000.0));
        assert!(btc.last_updated.is_some());

        let eth = quotes.quotes_for(&code("ETH")).unwrap().get("USD").unwrap();
        assert_eq!(eth.price, 2500.0);
        assert!(eth.market_cap.is_none());
    }

    #[tokio::test]
    async fn test_http_error_response() {
        let mock_server = create_mock_server(401, "unauthorized").await;

        let result = provider(&mock_server)
            .fetch_quotes(&[code("BTC")], &code("USD"))
            .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 401 Unauthorized for symbols: BTC: unauthorized"
        );
    }

    #[tokio::test]
    async fn test_provider_error_code() {
        let body = r#"{
            "status": {
                "timestamp": "2024-05-01T10:00:00.000Z",
                "error_code": 1002,
                "error_message": "API key missing.",
                "elapsed": 0,
                "credit_count": 0
            }
        }"#;
        let mock_server = create_mock_server(200, body).await;

        let result = provider(&mock_server)
            .fetch_quotes(&[code("BTC")], &code("USD"))
            .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "API error 1002: API key missing."
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server(200, r#"{"data": []}"#).await;

        let result = provider(&mock_server)
            .fetch_quotes(&[code("BTC")], &code("USD"))
            .await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse quote response for BTC")
        );
    }

    #[tokio::test]
    async fn test_unpriced_quote_keeps_symbol() {
        let body = r#"{
            "status": { "error_code": 0 },
            "data": {
                "XYZ": { "id": 9, "name": "Test", "symbol": "XYZ", "quote": { "USD": { "price": null } } }
            }
        }"#;
        let mock_server = create_mock_server(200, body).await;

        let quotes = provider(&mock_server)
            .fetch_quotes(&[code("XYZ")], &code("USD"))
            .await
            .unwrap();
        let entry = quotes.quotes_for(&code("XYZ")).unwrap();
        assert!(entry.is_empty());
    }

    #[tokio::test]
    async fn test_empty_symbols_skip_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_JSON))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server).fetch_quotes(&[], &code("USD")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUOTES_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(MOCK_JSON)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let provider =
            CoinMarketCapProvider::new(&mock_server.uri(), API_KEY, Duration::from_millis(50))
                .unwrap();
        let result = provider.fetch_quotes(&[code("BTC")], &code("USD")).await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Request failed for symbols: BTC")
        );
    }

    #[test]
    fn test_quotes_url_trims_trailing_slash() {
        let provider =
            CoinMarketCapProvider::new("http://localhost:1234/", API_KEY, Duration::from_secs(1))
                .unwrap();
        let url = provider.quotes_url("BTC,ETH", "USD").unwrap();
        assert_eq!(url.path(), QUOTES_PATH);
        let pairs: Vec<_> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("symbol".to_string(), "BTC,ETH".to_string()),
                ("convert".to_string(), "USD".to_string())
            ]
        );
    }
}
