use crate::core::diagnostics::Ratio;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
#[derive(Clone, Copy)]
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Warning,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Warning => style(text).yellow(),
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

/// Right-aligned cell for an amount.
pub fn amount_cell(value: f64) -> Cell {
    Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right)
}

/// Formats a [`Ratio`] as a percentage. Undefined ratios are displayed as "N/A".
pub fn ratio_cell(ratio: Ratio) -> Cell {
    match ratio.scaled(100.0) {
        Ratio::Value(v) => Cell::new(format!("{v:.2}%")).set_alignment(CellAlignment::Right),
        Ratio::NotApplicable => Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
    }
}

/// Creates a cell for a gain or loss with color coding.
pub fn pl_cell(value: f64) -> Cell {
    let color = if value >= 0.0 { Color::Green } else { Color::Red };
    Cell::new(format!("{value:+.2}"))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

/// Creates a cell for a return that is already a percentage.
pub fn return_cell(ratio: Ratio) -> Cell {
    match ratio {
        Ratio::Value(v) => {
            let color = if v >= 0.0 { Color::Green } else { Color::Red };
            Cell::new(format!("{v:.2}%"))
                .fg(color)
                .set_alignment(CellAlignment::Right)
        }
        Ratio::NotApplicable => Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
    }
}

/// Creates a spinner for work of unknown length.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Renders a titled bullet list, or nothing when `items` is empty.
pub fn bullet_list<T: std::fmt::Display>(title: &str, items: &[T], style_type: StyleType) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut output = format!("\n{}\n", style_text(title, StyleType::TotalLabel));
    let styled: Vec<String> = items
        .iter()
        .map(|item| {
            let text = item.to_string();
            match style_type {
                StyleType::Error => style_text(&text, StyleType::Error),
                StyleType::Warning => style_text(&text, StyleType::Warning),
                _ => style_text(&text, StyleType::Subtle),
            }
        })
        .collect();
    for item in styled {
        output.push_str(&format!("  - {item}\n"));
    }
    output
}

/// Returns the terminal width, or 80 when stdout is not a terminal.
pub fn term_width() -> usize {
    console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80)
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    println!("\n{}", "─".repeat(term_width()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_cell_formats_percentages() {
        assert_eq!(ratio_cell(Ratio::Value(0.6)).content(), "60.00%");
        assert_eq!(ratio_cell(Ratio::NotApplicable).content(), "N/A");
    }

    #[test]
    fn test_pl_cell_shows_sign() {
        assert_eq!(pl_cell(12.5).content(), "+12.50");
        assert_eq!(pl_cell(-3.0).content(), "-3.00");
    }

    #[test]
    fn test_bullet_list_empty() {
        let items: Vec<String> = Vec::new();
        assert!(bullet_list("Warnings", &items, StyleType::Warning).is_empty());
        let out = bullet_list("Warnings", &["one"], StyleType::Warning);
        assert!(out.contains("Warnings"));
        assert!(out.contains("one"));
    }
}
