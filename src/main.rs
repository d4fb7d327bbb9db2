use clap::Parser;
use coinconv::cli::ui;
use coinconv::core::config::{AppConfig, BASE_URL_VAR};
use coinconv::core::log;
use coinconv::providers::coinmarketcap::PRODUCTION_URL;
use std::process::ExitCode;
use tracing::instrument::WithSubscriber;
use tracing::level_filters::LevelFilter;

fn after_help() -> String {
    format!(
        "Examples:
  coinconv 1000 USD BTC
  coinconv 2 BTC ETH

Note: the default endpoint is the CoinMarketCap sandbox, which serves test data.
      Set {BASE_URL_VAR}={PRODUCTION_URL} to use the production API."
    )
}

#[derive(Parser)]
#[command(version, about, after_help = after_help())]
struct Cli {
    /// Amount to convert
    #[arg(allow_negative_numbers = true)]
    amount: String,

    /// Source currency code, e.g. USD or BTC
    from: String,

    /// Target currency code
    to: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long)]
    config_path: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Settings are not known yet, so startup warnings use a fixed level.
    let bootstrap = log::build_dispatch(if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    });
    let loaded = tracing::dispatcher::with_default(&bootstrap, || {
        AppConfig::load(cli.config_path.as_deref())
    });
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            report(&e);
            return ExitCode::FAILURE;
        }
    };

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        log::parse_level(&config.log_level)
    };
    let dispatch = log::build_dispatch(level);

    let args = coinconv::ConvertArgs {
        amount: cli.amount,
        from: cli.from,
        to: cli.to,
    };

    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let result = coinconv::run_until(&config, &args, ctrl_c)
        .with_subscriber(dispatch.clone())
        .await
        .map(|_| ());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::error!(error = %e, "Application failed");
            });
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn report(error: &anyhow::Error) {
    eprintln!(
        "{} {error:#}",
        ui::style_text("Error:", ui::StyleType::Error)
    );
}
