use super::ui;
use crate::core::currency::parse_amount;
use crate::core::{ConversionResult, Converter};
use anyhow::{Context, Result};

/// Renders the two result lines printed on success.
pub fn format_result(result: &ConversionResult) -> String {
    format!(
        "{} = {}\nExchange rate: 1 {} = {:.8} {}",
        result.from,
        result.to,
        result.from.currency(),
        result.rate,
        result.to.currency()
    )
}

pub async fn run(
    converter: &Converter,
    amount: &str,
    from: &str,
    to: &str,
) -> Result<ConversionResult> {
    let amount = parse_amount(amount).context("Invalid amount")?;

    let pb = ui::new_spinner(&format!(
        "Fetching {} -> {} rate",
        from.trim().to_uppercase(),
        to.trim().to_uppercase()
    ));
    let result = converter.convert(amount, from, to).await;
    pb.finish_and_clear();

    let result = result?;
    println!("{}", format_result(&result));
    Ok(result)
}
