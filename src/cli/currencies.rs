use super::ui;
use crate::core::ConversionService;
use anyhow::Result;

pub fn run(service: &ConversionService) -> Result<()> {
    println!(
        "\n{}",
        ui::style_text("Supported Currencies", ui::StyleType::Title)
    );
    for code in service.supported_currencies() {
        println!("{code}");
    }
    Ok(())
}
