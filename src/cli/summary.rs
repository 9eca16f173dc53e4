use super::ui;
use crate::core::config::Portfolio;
use crate::core::market::MarketDataProvider;
use crate::core::model::MarketSnapshot;
use crate::core::portfolio::{EntryBuild, build_entries};
use crate::core::valuation::{ValuationResult, valuate};
use anyhow::Result;
use comfy_table::Cell;
use console::style;

/// Valuation of one configured portfolio.
pub struct PortfolioSummary {
    pub name: String,
    pub build: EntryBuild,
    pub valuation: ValuationResult,
}

impl PortfolioSummary {
    pub fn new(portfolio: &Portfolio, snapshot: &MarketSnapshot) -> Self {
        let build = build_entries(portfolio, snapshot, false);
        let valuation = valuate(&build.entries);
        Self {
            name: portfolio.name.clone(),
            build,
            valuation,
        }
    }

    pub fn display_as_table(&self, currency: &str) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Investment"),
            ui::header_cell("Category"),
            ui::header_cell(&format!("Invested ({currency})")),
            ui::header_cell(&format!("Current ({currency})")),
            ui::header_cell("P/L"),
            ui::header_cell("Return"),
        ]);

        for entry in &self.build.entries {
            table.add_row(vec![
                Cell::new(&entry.name),
                Cell::new(entry.category.as_deref().unwrap_or("-")),
                ui::amount_cell(entry.invested_amount),
                ui::amount_cell(entry.current_value),
                ui::pl_cell(entry.profit_loss()),
                ui::return_cell(entry.return_pct()),
            ]);
        }

        let v = &self.valuation;
        table.add_row(vec![
            Cell::new(ui::style_text("Total", ui::StyleType::TotalLabel)),
            Cell::new(""),
            ui::amount_cell(v.total_invested),
            ui::amount_cell(v.total_current),
            ui::pl_cell(v.profit_loss),
            ui::return_cell(v.return_pct),
        ]);

        let mut output = format!(
            "Portfolio: {}\n\n",
            ui::style_text(&self.name, ui::StyleType::Title)
        );
        output.push_str(&table.to_string());

        output.push_str(&format!(
            "\n\nCurrent Value ({}): {}",
            ui::style_text(currency, ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}", v.total_current), ui::StyleType::TotalValue)
        ));

        output.push_str(&ui::bullet_list(
            "Warnings",
            &self.build.warnings,
            ui::StyleType::Warning,
        ));
        output.push_str(&ui::bullet_list(
            "Rejected",
            &v.rejected,
            ui::StyleType::Error,
        ));
        output.push_str(&ui::bullet_list(
            "Inactive funds not counted",
            &self.build.excluded,
            ui::StyleType::Subtle,
        ));

        output
    }
}

/// Valuates every portfolio and, with more than one, the combined holdings.
pub fn summarize(portfolios: &[Portfolio], snapshot: &MarketSnapshot) -> (Vec<PortfolioSummary>, ValuationResult) {
    let summaries: Vec<PortfolioSummary> = portfolios
        .iter()
        .map(|portfolio| PortfolioSummary::new(portfolio, snapshot))
        .collect();
    let all_entries: Vec<_> = summaries
        .iter()
        .flat_map(|s| s.build.entries.iter().cloned())
        .collect();
    (summaries, valuate(&all_entries))
}

pub async fn run(
    portfolios: &[Portfolio],
    provider: &(dyn MarketDataProvider + Send + Sync),
    currency: &str,
) -> Result<()> {
    // Valuation needs no holdings.
    let snapshot = super::load_snapshot(provider, &[]).await?;
    let (summaries, grand_total) = summarize(portfolios, &snapshot);

    let num_summaries = summaries.len();
    for (i, summary) in summaries.iter().enumerate() {
        println!("{}", summary.display_as_table(currency));
        if i < num_summaries - 1 {
            ui::print_separator();
        }
    }

    if num_summaries > 1 {
        let term_width = ui::term_width();
        println!("\n{}", "=".repeat(term_width));
        let total_str = format!(
            "Grand Total ({currency}): {:.2} invested, {:.2} current, {:+.2} ({:.2}%)",
            grand_total.total_invested,
            grand_total.total_current,
            grand_total.profit_loss,
            grand_total.return_pct
        );
        let styled_total = style(&total_str).bold().green();
        println!("{styled_total:>term_width$}");
    }

    Ok(())
}
