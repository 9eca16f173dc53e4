use super::ui;
use crate::core::market::MarketDataProvider;
use crate::core::model::MarketSnapshot;
use crate::core::overlap::{IndexCoverage, index_coverage};
use anyhow::{Context, Result, bail};
use comfy_table::{Cell, CellAlignment};
use tracing::debug;

#[derive(Debug, Default)]
pub struct CoverageReport {
    pub coverage: Vec<IndexCoverage>,
    /// Inactive funds left out of the report.
    pub excluded_funds: Vec<String>,
}

/// Index coverage of each requested fund, in request order. Unknown funds are
/// skipped. Inactive funds are only measured when `include_inactive` is set.
pub fn coverage_report(
    snapshot: &MarketSnapshot,
    fund_ids: &[String],
    index_id: &str,
    members: &[String],
    include_inactive: bool,
) -> CoverageReport {
    let mut report = CoverageReport::default();
    for fund in snapshot.funds_with_holdings(fund_ids) {
        if !fund.fund.is_active && !include_inactive {
            debug!(fund_id = %fund.fund.fund_id, "Inactive fund left out of coverage");
            report.excluded_funds.push(fund.fund.fund_id);
            continue;
        }
        report
            .coverage
            .push(index_coverage(&fund, index_id, members));
    }
    report
}

fn display_coverage_table(
    snapshot: &MarketSnapshot,
    index_name: &str,
    members: usize,
    report: &CoverageReport,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Fund"),
        ui::header_cell("Constituents Held"),
        ui::header_cell("Weight in Index"),
    ]);

    for c in &report.coverage {
        let name = snapshot
            .fund(&c.fund_id)
            .map_or_else(|| c.fund_id.clone(), |f| f.name.clone());
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{} / {}", c.covered_stocks.len(), members))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", c.covered_pct)).set_alignment(CellAlignment::Right),
        ]);
    }

    let mut output = format!(
        "Index: {}\n\n",
        ui::style_text(index_name, ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output.push_str(&ui::bullet_list(
        "Inactive funds not counted",
        &report.excluded_funds,
        ui::StyleType::Subtle,
    ));
    output
}

pub async fn run(
    fund_ids: &[String],
    index_id: &str,
    provider: &(dyn MarketDataProvider + Send + Sync),
    include_inactive: bool,
) -> Result<()> {
    if fund_ids.is_empty() {
        bail!("No funds to check. Add mutual funds to a portfolio");
    }

    let snapshot = super::load_snapshot(provider, fund_ids).await?;
    let mut members = provider
        .fetch_index_members(index_id)
        .await
        .with_context(|| format!("Failed to fetch constituents of index {index_id}"))?;
    if members.is_empty() {
        debug!(index_id, "No constituents listed, using stock index tags");
        members = snapshot.stocks.members_of(index_id);
    }

    let index_name = snapshot
        .indices
        .iter()
        .find(|i| i.index_id == index_id)
        .map_or(index_id, |i| i.name.as_str());

    let report = coverage_report(&snapshot, fund_ids, index_id, &members, include_inactive);
    println!(
        "{}",
        display_coverage_table(&snapshot, index_name, members.len(), &report)
    );
    Ok(())
}
