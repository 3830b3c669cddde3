use super::ui;
use crate::core::{ConversionService, RateEntry};
use anyhow::Result;
use comfy_table::Cell;

fn rates_table(entries: &[RateEntry]) -> comfy_table::Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("Last Updated"),
    ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.pair),
            ui::number_cell(entry.rate, 6),
            Cell::new(entry.observed_at.format("%Y-%m-%d %H:%M:%S")),
        ]);
    }
    table
}

/// Lists every cached rate along with when it was stored.
pub async fn run(service: &ConversionService) -> Result<()> {
    let entries = service.cached_rates().await?;
    if entries.is_empty() {
        println!("No cached rates yet.");
        return Ok(());
    }

    println!("\n{}", ui::style_text("Cached Rates", ui::StyleType::Title));
    println!("{}", rates_table(&entries));
    Ok(())
}
