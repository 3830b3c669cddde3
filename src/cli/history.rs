use super::ui;
use crate::core::{ConversionRecord, ConversionService};
use anyhow::Result;
use comfy_table::Cell;

fn history_table(records: &[ConversionRecord]) -> comfy_table::Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Amount"),
        ui::header_cell("From"),
        ui::header_cell("Result"),
        ui::header_cell("To"),
        ui::header_cell("Rate"),
    ]);
    for record in records {
        table.add_row(vec![
            Cell::new(record.timestamp.format("%Y-%m-%d %H:%M:%S")),
            ui::number_cell(record.amount, 2),
            Cell::new(&record.pair.from),
            ui::number_cell(record.result, 2),
            Cell::new(&record.pair.to),
            ui::number_cell(record.rate, 4),
        ]);
    }
    table
}

pub async fn run(service: &ConversionService, limit: usize) -> Result<()> {
    let records = service.recent_history(limit).await?;
    if records.is_empty() {
        println!("No conversion history found.");
        return Ok(());
    }

    println!(
        "\n{}",
        ui::style_text("Conversion History", ui::StyleType::Title)
    );
    println!("{}", history_table(&records));
    Ok(())
}
