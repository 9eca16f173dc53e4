//! Turns configured investments into portfolio entries priced from a snapshot.
use crate::core::config::{Investment, Portfolio};
use crate::core::diagnostics::{DataQualityWarning, WarningLog};
use crate::core::model::MarketSnapshot;
use crate::core::valuation::{AssetKind, PortfolioEntry};
use tracing::debug;

#[derive(Debug, Default)]
pub struct EntryBuild {
    pub entries: Vec<PortfolioEntry>,
    pub warnings: Vec<DataQualityWarning>,
    /// Ids of inactive funds that were skipped.
    pub excluded: Vec<String>,
}

fn current_value(override_value: Option<f64>, units: Option<f64>, price: Option<f64>) -> Option<f64> {
    override_value.or_else(|| Some(units? * price?))
}

/// Prices every investment of `portfolio` against `snapshot`.
///
/// The configured `current_value` wins over `units * price`. Investments that
/// cannot be priced are skipped with a [`DataQualityWarning::MissingPrice`].
/// Inactive funds are skipped unless `include_inactive` is set.
pub fn build_entries(
    portfolio: &Portfolio,
    snapshot: &MarketSnapshot,
    include_inactive: bool,
) -> EntryBuild {
    let mut build = EntryBuild::default();
    let mut warnings = WarningLog::default();

    for investment in &portfolio.investments {
        match investment {
            Investment::MutualFund(mf) => {
                let fund = snapshot.fund(&mf.fund_id);
                if let Some(f) = fund {
                    if !f.is_active && !include_inactive {
                        debug!(fund_id = %mf.fund_id, "Skipping inactive fund");
                        build.excluded.push(mf.fund_id.clone());
                        continue;
                    }
                }
                let nav = fund.and_then(|f| f.nav);
                let Some(value) = current_value(mf.current_value, mf.units, nav) else {
                    warnings.push(DataQualityWarning::MissingPrice {
                        id: mf.fund_id.clone(),
                    });
                    continue;
                };
                build.entries.push(PortfolioEntry {
                    id: mf.fund_id.clone(),
                    name: fund.map_or_else(|| mf.fund_id.clone(), |f| f.name.clone()),
                    kind: AssetKind::Fund,
                    category: mf
                        .category
                        .clone()
                        .or_else(|| fund.and_then(|f| f.fund_type.clone())),
                    invested_amount: mf.invested,
                    current_value: value,
                });
            }
            Investment::Stock(s) => {
                let stock = snapshot.stocks.get(&s.stock_id);
                let price = stock.and_then(|st| st.current_price);
                let Some(value) = current_value(s.current_value, s.units, price) else {
                    warnings.push(DataQualityWarning::MissingPrice {
                        id: s.stock_id.clone(),
                    });
                    continue;
                };
                build.entries.push(PortfolioEntry {
                    id: s.stock_id.clone(),
                    name: stock.map_or_else(|| s.stock_id.clone(), |st| st.name.clone()),
                    kind: AssetKind::Stock,
                    category: s
                        .category
                        .clone()
                        .or_else(|| stock.and_then(|st| st.sector.clone())),
                    invested_amount: s.invested,
                    current_value: value,
                });
            }
        }
    }

    build.warnings = warnings.into_inner();
    build
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{FundInvestment, StockInvestment};
    use crate::core::model::fixtures::{fund, stock};
    use crate::core::model::StockUniverse;
    use std::collections::HashMap;

    fn snapshot() -> MarketSnapshot {
        let mut inactive = fund("OLD", Some(10.0));
        inactive.is_active = false;
        let mut no_nav = fund("NONAV", Some(10.0));
        no_nav.nav = None;
        MarketSnapshot {
            stocks: vec![stock("INFY")].into_iter().collect::<StockUniverse>(),
            funds: vec![fund("F1", Some(1000.0)), inactive, no_nav],
            holdings: HashMap::new(),
            indices: Vec::new(),
            fetched_at: chrono::Utc::now(),
        }
    }

    fn mf(id: &str, units: Option<f64>, current_value: Option<f64>) -> Investment {
        Investment::MutualFund(FundInvestment {
            fund_id: id.to_string(),
            units,
            invested: 100.0,
            current_value,
            category: None,
        })
    }

    #[test]
    fn test_build_entries_prices_from_snapshot() {
        let portfolio = Portfolio {
            name: "Core".to_string(),
            investments: vec![
                mf("F1", Some(12.0), None),
                Investment::Stock(StockInvestment {
                    stock_id: "INFY".to_string(),
                    units: Some(3.0),
                    invested: 250.0,
                    current_value: None,
                    category: None,
                }),
            ],
        };

        let build = build_entries(&portfolio, &snapshot(), false);

        assert_eq!(build.entries.len(), 2);
        assert_eq!(build.entries[0].current_value, 120.0);
        assert_eq!(build.entries[0].name, "F1 Fund");
        assert_eq!(build.entries[0].category.as_deref(), Some("Equity"));
        assert_eq!(build.entries[1].kind, AssetKind::Stock);
        assert_eq!(build.entries[1].current_value, 300.0);
        assert_eq!(build.entries[1].category.as_deref(), Some("Financials"));
        assert!(build.warnings.is_empty());
    }

    #[test]
    fn test_override_and_missing_price() {
        let portfolio = Portfolio {
            name: "Edge".to_string(),
            investments: vec![
                mf("NONAV", Some(5.0), None),
                mf("NONAV", None, Some(42.0)),
                mf("UNLISTED", None, Some(7.0)),
            ],
        };

        let build = build_entries(&portfolio, &snapshot(), false);

        assert_eq!(build.entries.len(), 2);
        assert_eq!(build.entries[0].current_value, 42.0);
        assert_eq!(build.entries[1].name, "UNLISTED");
        assert_eq!(
            build.warnings,
            vec![DataQualityWarning::MissingPrice {
                id: "NONAV".to_string()
            }]
        );
    }

    #[test]
    fn test_inactive_funds_skipped_unless_requested() {
        let portfolio = Portfolio {
            name: "Old".to_string(),
            investments: vec![mf("OLD", Some(1.0), None), mf("F1", Some(1.0), None)],
        };

        let build = build_entries(&portfolio, &snapshot(), false);
        assert_eq!(build.entries.len(), 1);
        assert_eq!(build.excluded, vec!["OLD"]);

        let build = build_entries(&portfolio, &snapshot(), true);
        assert_eq!(build.entries.len(), 2);
        assert!(build.excluded.is_empty());
    }
}
