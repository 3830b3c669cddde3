use super::ui;
use crate::core::{ConversionRecord, ConversionService, CurrencyCode};
use anyhow::{Context, Result};

pub(crate) fn parse_codes(from: &str, to: &str) -> Result<(CurrencyCode, CurrencyCode)> {
    let from: CurrencyCode = from
        .parse()
        .with_context(|| format!("Invalid source currency: {from}"))?;
    let to: CurrencyCode = to
        .parse()
        .with_context(|| format!("Invalid target currency: {to}"))?;
    Ok((from, to))
}

fn format_conversion(record: &ConversionRecord) -> String {
    format!(
        "{:.2} {} = {:.2} {}",
        record.amount, record.pair.from, record.result, record.pair.to
    )
}

fn format_rate(from: &CurrencyCode, to: &CurrencyCode, rate: f64) -> String {
    format!("1 {from} = {rate:.4} {to}")
}

fn print_conversion(record: &ConversionRecord) {
    println!(
        "\n{}",
        ui::style_text(&format_conversion(record), ui::StyleType::Value)
    );
    println!(
        "{}",
        ui::style_text(
            &format!(
                "Exchange rate: {}",
                format_rate(&record.pair.from, &record.pair.to, record.rate)
            ),
            ui::StyleType::Subtle
        )
    );
}

pub async fn run_convert(
    service: &ConversionService,
    amount: f64,
    from: &str,
    to: &str,
) -> Result<()> {
    let (from, to) = parse_codes(from, to)?;
    let pb = ui::new_spinner(&format!("Converting {from} to {to}"));
    let result = service.convert(amount, &from, &to).await;
    pb.finish_and_clear();

    let record = result.with_context(|| format!("Could not convert {from} to {to}"))?;
    print_conversion(&record);
    Ok(())
}

pub async fn run_swap(
    service: &ConversionService,
    amount: f64,
    from: &str,
    to: &str,
) -> Result<()> {
    let (from, to) = parse_codes(from, to)?;
    let pb = ui::new_spinner(&format!("Converting {to} to {from}"));
    let result = service.swap(amount, &from, &to).await;
    pb.finish_and_clear();

    let record = result.with_context(|| format!("Could not convert {to} to {from}"))?;
    print_conversion(&record);
    Ok(())
}

pub async fn run_rate(service: &ConversionService, from: &str, to: &str) -> Result<()> {
    let (from, to) = parse_codes(from, to)?;
    let pb = ui::new_spinner(&format!("Resolving {from}/{to}"));
    let result = service.resolve(&from, &to).await;
    pb.finish_and_clear();

    let rate = result.with_context(|| format!("Rate not available for {from}/{to}"))?;
    println!(
        "\n{}",
        ui::style_text(&format_rate(&from, &to, rate), ui::StyleType::Value)
    );
    Ok(())
}
