use super::ui;
use crate::core::allocation::{Allocation, AllocationEntry, allocate};
use crate::core::config::Portfolio;
use crate::core::diagnostics::DataQualityWarning;
use crate::core::market::MarketDataProvider;
use crate::core::model::MarketSnapshot;
use crate::core::portfolio::build_entries;
use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{Cell, CellAlignment};

/// How portfolio entries are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AllocationBasis {
    /// The fund type or stock sector, or the category set in the config
    #[default]
    Category,
    /// Equity, debt, hybrid or other
    AssetClass,
}

#[derive(Debug)]
pub struct PortfolioAllocation {
    pub allocation: Allocation,
    /// Investments that could not be priced.
    pub warnings: Vec<DataQualityWarning>,
    /// Inactive funds left out.
    pub excluded: Vec<String>,
}

/// Allocation of one portfolio's current value.
pub fn portfolio_allocation(
    portfolio: &Portfolio,
    snapshot: &MarketSnapshot,
    basis: AllocationBasis,
) -> PortfolioAllocation {
    let build = build_entries(portfolio, snapshot, false);
    let entries: Vec<AllocationEntry> = build
        .entries
        .iter()
        .map(|entry| match basis {
            AllocationBasis::Category => AllocationEntry::by_category(entry),
            AllocationBasis::AssetClass => AllocationEntry::by_asset_class(entry),
        })
        .collect();
    PortfolioAllocation {
        allocation: allocate(&entries),
        warnings: build.warnings,
        excluded: build.excluded,
    }
}

fn display_allocation_table(
    portfolio_name: &str,
    result: &PortfolioAllocation,
    currency: &str,
) -> String {
    let allocation = &result.allocation;
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell("Holdings"),
        ui::header_cell(&format!("Value ({currency})")),
        ui::header_cell("Allocation"),
    ]);

    for group in &allocation.groups {
        table.add_row(vec![
            Cell::new(&group.label),
            Cell::new(group.count).set_alignment(CellAlignment::Right),
            ui::amount_cell(group.aggregate_value),
            ui::ratio_cell(group.share),
        ]);
    }

    let mut output = format!(
        "\nPortfolio: {}\n\n",
        ui::style_text(portfolio_name, ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\nTotal ({}): {}",
        ui::style_text(currency, ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:.2}", allocation.total_value),
            ui::StyleType::TotalValue
        )
    ));
    output.push_str(&ui::bullet_list(
        "Warnings",
        &result.warnings,
        ui::StyleType::Warning,
    ));
    output.push_str(&ui::bullet_list(
        "Rejected",
        &allocation.rejected,
        ui::StyleType::Error,
    ));
    output.push_str(&ui::bullet_list(
        "Inactive funds not counted",
        &result.excluded,
        ui::StyleType::Subtle,
    ));
    output
}

pub async fn run(
    portfolios: &[Portfolio],
    provider: &(dyn MarketDataProvider + Send + Sync),
    currency: &str,
    basis: AllocationBasis,
) -> Result<()> {
    let snapshot = super::load_snapshot(provider, &[]).await?;

    for portfolio in portfolios {
        // Skip empty portfolios
        if portfolio.investments.is_empty() {
            continue;
        }
        let result = portfolio_allocation(portfolio, &snapshot, basis);
        println!(
            "{}",
            display_allocation_table(&portfolio.name, &result, currency)
        );
    }

    Ok(())
}
