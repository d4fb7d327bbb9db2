pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{ConversionError, ConversionResult, Converter};
use anyhow::Result;
use tracing::{debug, info};

/// Positional arguments of a conversion, as typed by the user.
#[derive(Debug, Clone)]
pub struct ConvertArgs {
    pub amount: String,
    pub from: String,
    pub to: String,
}

/// Converts and prints one amount using the configured CoinMarketCap endpoint.
pub async fn run(config: &AppConfig, args: &ConvertArgs) -> Result<ConversionResult> {
    info!("Currency converter starting...");
    debug!(base_url = %config.base_url, timeout = ?config.timeout, "Loaded config");

    let provider = providers::coinmarketcap::CoinMarketCapProvider::new(
        &config.base_url,
        &config.api_key,
        config.timeout,
    )?;
    let converter = Converter::new(Box::new(provider), config.timeout);

    cli::convert::run(&converter, &args.amount, &args.from, &args.to).await
}

/// Like [`run`], but gives up with [`ConversionError::Interrupted`] as soon as
/// `cancel` completes.
pub async fn run_until<F>(
    config: &AppConfig,
    args: &ConvertArgs,
    cancel: F,
) -> Result<ConversionResult>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = cancel => {
            info!("Conversion interrupted");
            Err(ConversionError::Interrupted.into())
        }
        result = run(config, args) => result,
    }
}
