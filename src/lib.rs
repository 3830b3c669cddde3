pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use anyhow::Result;
use tracing::{debug, info};

/// Commands that operate on rates and conversions.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Convert { amount: f64, from: String, to: String },
    Swap { amount: f64, from: String, to: String },
    Rate { from: String, to: String },
    History { limit: usize },
    Currencies,
    Rates,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => crate::core::config::AppConfig::load_from_path(path)?,
        None => crate::core::config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let context = crate::core::FxContext::open(config)?;
    let service = context.conversion_service();

    match command {
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run_convert(&service, amount, &from, &to).await
        }
        AppCommand::Swap { amount, from, to } => {
            cli::convert::run_swap(&service, amount, &from, &to).await
        }
        AppCommand::Rate { from, to } => cli::convert::run_rate(&service, &from, &to).await,
        AppCommand::History { limit } => cli::history::run(&service, limit).await,
        AppCommand::Currencies => cli::currencies::run(&service),
        AppCommand::Rates => cli::rates::run(&service).await,
    }
}
