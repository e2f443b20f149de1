use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::core::{CurrencyCatalog, UiNotifier};

/// Codes per row when printing the catalog.
const CATALOG_COLUMNS: usize = 8;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Amount,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Amount => style(text).green().bold(),
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

/// Lays the catalog out row by row, keeping provider order.
pub fn catalog_table(catalog: &CurrencyCatalog) -> Table {
    let mut table = new_styled_table();
    for chunk in catalog.codes().chunks(CATALOG_COLUMNS) {
        table.add_row(
            chunk
                .iter()
                .map(|code| Cell::new(code).fg(Color::Cyan).add_attribute(Attribute::Bold)),
        );
    }
    table
}

/// Creates a spinner shown while waiting on the network.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Terminal-backed notifier: amounts on stdout, failures on stderr.
pub struct ConsoleNotifier;

impl UiNotifier for ConsoleNotifier {
    fn show_catalog(&self, catalog: &CurrencyCatalog) {
        println!(
            "{} ({})\n{}",
            style_text("Supported currencies", StyleType::Title),
            catalog.len(),
            catalog_table(catalog)
        );
    }

    fn show_amount(&self, amount: &str) {
        println!("{}", style_text(amount, StyleType::Amount));
    }

    fn show_failure(&self, message: &str) {
        eprintln!("{}", style_text(message, StyleType::Error));
    }
}
