use super::ui;
use crate::core::{Converter, RefreshStatus};
use anyhow::Result;
use tracing::debug;

/// Runs a refresh in the background and waits for it behind a spinner.
pub async fn refresh_with_progress(converter: &Converter) -> RefreshStatus {
    let spinner = ui::new_spinner("Fetching latest exchange rates");
    let status = converter.refresh_rates().wait().await;
    spinner.finish_and_clear();
    debug!(?status, "Refresh finished");
    status
}

/// `refresh` command: fetch and store the latest rates once.
pub async fn refresh(converter: &Converter) -> Result<()> {
    let status = refresh_with_progress(converter).await;
    eprintln!("{}", ui::refresh_message(&status));
    match status {
        RefreshStatus::Error(message) => Err(anyhow::anyhow!(message)),
        _ => Ok(()),
    }
}

/// `convert` command: one conversion, refreshing the rates first unless `offline`.
pub async fn convert(
    converter: &Converter,
    amount: &str,
    from: &str,
    to: &str,
    offline: bool,
) -> Result<()> {
    if !offline {
        let status = refresh_with_progress(converter).await;
        if !matches!(status, RefreshStatus::Ok { .. }) {
            // Stored or base rates may still be enough
            eprintln!("{}", ui::refresh_message(&status));
        }
    }

    match converter.convert(amount, Some(from), Some(to)) {
        Ok(text) => {
            println!("{}", ui::style_text(&text, ui::StyleType::Result));
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", ui::prompt_message(&e.to_string(), e.severity()));
            Err(e.into())
        }
    }
}
