use super::ui;
use crate::core::market::MarketDataProvider;
use crate::core::overlap::{OverlapOptions, OverlapReport, detect_overlap};
use anyhow::{Result, bail};
use comfy_table::{Cell, CellAlignment};
use tracing::warn;

fn display_rows(report: &OverlapReport) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Stock"),
        ui::header_cell("Held by"),
        ui::header_cell("Total Exposure"),
        ui::header_cell("Overlap Ratio"),
    ]);

    for row in report.overlapping() {
        let held_by = row
            .per_fund
            .iter()
            .map(|f| format!("{} ({:.2})", f.fund_id, f.exposure))
            .collect::<Vec<_>>()
            .join("\n");
        let name = match &row.stock_name {
            Some(name) => format!("{name}\n{}", ui::style_text(&row.stock_id, ui::StyleType::Subtle)),
            None => row.stock_id.clone(),
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(held_by),
            ui::amount_cell(row.total_exposure),
            ui::ratio_cell(row.overlap_ratio),
        ]);
    }

    table.to_string()
}

fn display_pairs(report: &OverlapReport) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Fund"),
        ui::header_cell("Fund"),
        ui::header_cell("Common Stocks"),
        ui::header_cell("Overlap"),
    ]);

    for pair in &report.fund_pairs {
        table.add_row(vec![
            Cell::new(&pair.fund_a),
            Cell::new(&pair.fund_b),
            Cell::new(pair.common_stocks.len()).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", pair.overlap_pct)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}

pub fn display_report(report: &OverlapReport) -> String {
    let shared = report.overlapping().count();
    let mut output = format!(
        "{}\n\n",
        ui::style_text("Stocks held by more than one fund", ui::StyleType::Title)
    );

    if shared == 0 {
        output.push_str(&ui::style_text(
            "No stock is held by more than one fund.",
            ui::StyleType::Subtle,
        ));
    } else {
        output.push_str(&display_rows(report));
    }
    output.push_str(&format!(
        "\n\n{} of {} stocks are shared",
        ui::style_text(&shared.to_string(), ui::StyleType::TotalValue),
        report.rows.len()
    ));

    if !report.fund_pairs.is_empty() {
        output.push_str(&format!(
            "\n\n{}\n\n",
            ui::style_text("Fund pairs", ui::StyleType::Title)
        ));
        output.push_str(&display_pairs(report));
    }

    output.push_str(&ui::bullet_list(
        "Warnings",
        &report.warnings,
        ui::StyleType::Warning,
    ));
    output.push_str(&ui::bullet_list(
        "Rejected",
        &report.rejected,
        ui::StyleType::Error,
    ));
    output.push_str(&ui::bullet_list(
        "Inactive funds excluded",
        &report.excluded_funds,
        ui::StyleType::Subtle,
    ));
    output
}

pub async fn run(
    fund_ids: &[String],
    provider: &(dyn MarketDataProvider + Send + Sync),
    options: &OverlapOptions,
) -> Result<()> {
    if fund_ids.is_empty() {
        bail!("No funds to compare. Pass --fund or add mutual funds to a portfolio");
    }

    let snapshot = super::load_snapshot(provider, fund_ids).await?;
    let funds = snapshot.funds_with_holdings(fund_ids);
    for id in fund_ids {
        if snapshot.fund(id).is_none() {
            warn!(fund_id = %id, "Unknown fund skipped");
        }
    }

    let report = detect_overlap(&funds, &snapshot.stocks, options);
    println!("{}", display_report(&report));
    Ok(())
}
