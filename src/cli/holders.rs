use super::ui;
use crate::core::diagnostics::Ratio;
use crate::core::market::MarketDataProvider;
use crate::core::model::MarketSnapshot;
use crate::core::overlap::{OverlapOptions, OverlapReport, detect_overlap};
use anyhow::{Result, bail};
use comfy_table::Cell;
use tracing::debug;

fn display_holders(snapshot: &MarketSnapshot, stock_id: &str, report: &OverlapReport) -> String {
    let title = match snapshot.stocks.get(stock_id) {
        Some(stock) => format!("{} ({stock_id})", stock.name),
        None => stock_id.to_string(),
    };
    let mut output = format!(
        "Held by: {}\n\n",
        ui::style_text(&title, ui::StyleType::Title)
    );

    let holders = report.holders(stock_id);
    if holders.is_empty() {
        output.push_str(&ui::style_text(
            "No compared fund holds this stock.",
            ui::StyleType::Subtle,
        ));
    } else {
        let total = report.row(stock_id).map_or(0.0, |r| r.total_exposure);
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Fund"),
            ui::header_cell("Exposure"),
            ui::header_cell("Share of Total"),
        ]);
        for holder in holders {
            let name = snapshot
                .fund(&holder.fund_id)
                .map_or_else(|| holder.fund_id.clone(), |f| f.name.clone());
            table.add_row(vec![
                Cell::new(name),
                ui::amount_cell(holder.exposure),
                ui::ratio_cell(Ratio::of(holder.exposure, total)),
            ]);
        }
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{} {}",
            ui::style_text("Total exposure:", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{total:.2}"), ui::StyleType::TotalValue)
        ));
    }

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

/// Prints which of `fund_ids` hold `stock_id`, with each fund's exposure.
pub async fn run(
    fund_ids: &[String],
    stock_id: &str,
    provider: &(dyn MarketDataProvider + Send + Sync),
    options: &OverlapOptions,
) -> Result<()> {
    if fund_ids.is_empty() {
        bail!("No funds to search. Add mutual funds to a portfolio");
    }

    let snapshot = super::load_snapshot(provider, fund_ids).await?;
    if !snapshot.stocks.contains(stock_id) {
        bail!("Unknown stock {stock_id}");
    }

    let funds = snapshot.funds_with_holdings(fund_ids);
    let report = detect_overlap(&funds, &snapshot.stocks, options);
    debug!(stock_id, holders = report.holders(stock_id).len(), "Holders found");
    println!("{}", display_holders(&snapshot, stock_id, &report));
    Ok(())
}
