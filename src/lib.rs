pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::Converter;
use crate::providers::OpenExchangeRatesProvider;
use crate::store::SqliteRateStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        amount: String,
        from: String,
        to: String,
        offline: bool,
    },
    Refresh,
    Rates,
    Interactive,
}

/// Wires the SQLite store and the HTTP provider from `config`.
pub fn build_converter(config: &AppConfig) -> Result<Converter> {
    let base = config.base_currency()?;
    let database_path = config.database_path()?;
    debug!("Using rate database at {}", database_path.display());

    let store = SqliteRateStore::new(database_path);
    let provider = OpenExchangeRatesProvider::from_config(&config.provider);

    Ok(Converter::new(Arc::new(store), Arc::new(provider), base))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let converter = build_converter(&config).context("Failed to set up the converter")?;

    match command {
        AppCommand::Convert {
            amount,
            from,
            to,
            offline,
        } => cli::convert::convert(&converter, &amount, &from, &to, offline).await,
        AppCommand::Refresh => cli::convert::refresh(&converter).await,
        AppCommand::Rates => cli::rates::show_rates(&converter),
        AppCommand::Interactive => cli::interactive::run(&converter).await,
    }
}
