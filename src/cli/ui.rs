use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::core::{RefreshStatus, Severity};

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Result,
    Warning,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Result => style(text).green().bold(),
        StyleType::Warning => style(text).yellow(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn number_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Creates a spinner shown while waiting on the network.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Text shown to the user when a refresh finishes.
pub fn refresh_message(status: &RefreshStatus) -> String {
    match status {
        RefreshStatus::Ok { updated } => {
            style_text(&format!("Exchange rates updated ({updated} currencies)"), StyleType::Subtle)
        }
        RefreshStatus::Warning(message) => {
            style_text(&format!("Warning: {message}"), StyleType::Warning)
        }
        RefreshStatus::Error(message) => style_text(&format!("Error: {message}"), StyleType::Error),
    }
}

/// Text shown for a failed conversion, styled by how serious it is.
pub fn prompt_message(message: &str, severity: Severity) -> String {
    match severity {
        Severity::Info => style_text(message, StyleType::Subtle),
        Severity::Error => style_text(&format!("Error: {message}"), StyleType::Error),
    }
}
