use super::ui;
use crate::core::{Converter, RateRecord};
use anyhow::{Context, Result};
use chrono::Local;

/// Renders stored rates as a table, relative to `base`.
pub fn display_as_table(records: &[RateRecord], base: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate (per 1 {base})")),
        ui::header_cell("Updated"),
    ]);

    for record in records {
        let updated = record.timestamp.with_timezone(&Local);
        table.add_row(vec![
            comfy_table::Cell::new(&record.currency_code),
            ui::number_cell(format!("{:.4}", record.exchange_rate)),
            comfy_table::Cell::new(updated.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    table.to_string()
}

/// Prints the rates currently held by the store.
pub fn show_rates(converter: &Converter) -> Result<()> {
    let records = converter
        .store()
        .all()
        .context("Failed to read stored exchange rates")?;

    if records.is_empty() {
        println!(
            "{}",
            ui::style_text(
                "No exchange rates stored yet, run `fxconv refresh` first",
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    println!(
        "{}",
        ui::style_text("Stored exchange rates", ui::StyleType::Title)
    );
    println!(
        "{}",
        display_as_table(&records, converter.lookup().base().as_str())
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_display_as_table() {
        let records = vec![
            RateRecord {
                id: 1,
                currency_code: "EUR".to_string(),
                exchange_rate: 0.91954,
                timestamp: Utc::now(),
            },
            RateRecord {
                id: 2,
                currency_code: "JPY".to_string(),
                exchange_rate: 156.71,
                timestamp: Utc::now(),
            },
        ];

        let rendered = display_as_table(&records, "USD");
        assert!(rendered.contains("Rate (per 1 USD)"));
        assert!(rendered.contains("EUR"));
        assert!(rendered.contains("0.9195"));
        assert!(rendered.contains("156.7100"));
    }
}
