//! Cross-fund stock overlap.
//!
//! Every call recomputes the full report from the funds and holdings it is
//! given. Inputs are only read.

use crate::core::diagnostics::{
    DataQualityWarning, InvalidRecord, Ratio, RejectedRecord, WarningLog,
};
use crate::core::model::{Fund, FundWithHoldings, Holding, StockUniverse};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Percentage points a fund's holdings may exceed 100% by before a warning.
pub const DEFAULT_HOLDING_SUM_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlapOptions {
    pub include_inactive: bool,
    pub holding_sum_tolerance: f64,
}

impl Default for OverlapOptions {
    fn default() -> Self {
        Self {
            include_inactive: false,
            holding_sum_tolerance: DEFAULT_HOLDING_SUM_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundExposure {
    pub fund_id: String,
    pub exposure: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapRow {
    pub stock_id: String,
    pub stock_name: Option<String>,
    pub total_exposure: f64,
    /// Total exposure over the combined assets of the funds holding the stock.
    pub overlap_ratio: Ratio,
    /// One entry per fund, in input order.
    pub per_fund: Vec<FundExposure>,
    pub is_overlapping: bool,
}

/// How much two funds' portfolios coincide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundPairOverlap {
    pub fund_a: String,
    pub fund_b: String,
    pub common_stocks: Vec<String>,
    /// Sum over common stocks of the smaller of the two weights, in percent.
    pub overlap_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlapReport {
    /// Sorted by total exposure descending, then stock id ascending.
    pub rows: Vec<OverlapRow>,
    pub fund_pairs: Vec<FundPairOverlap>,
    pub warnings: Vec<DataQualityWarning>,
    pub rejected: Vec<RejectedRecord>,
    /// Inactive funds left out of the comparison.
    pub excluded_funds: Vec<String>,
}

impl OverlapReport {
    pub fn overlapping(&self) -> impl Iterator<Item = &OverlapRow> {
        self.rows.iter().filter(|r| r.is_overlapping)
    }

    pub fn row(&self, stock_id: &str) -> Option<&OverlapRow> {
        self.rows.iter().find(|r| r.stock_id == stock_id)
    }

    /// Funds holding `stock_id`, in input order. Empty when no compared fund
    /// holds it.
    pub fn holders(&self, stock_id: &str) -> &[FundExposure] {
        self.row(stock_id).map_or(&[], |r| r.per_fund.as_slice())
    }
}

/// Share of a fund's holding weight that sits in one index's constituents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexCoverage {
    pub fund_id: String,
    pub index_id: String,
    pub covered_pct: f64,
    pub covered_stocks: Vec<String>,
}

fn validate_holding(holding: &Holding) -> Result<(), InvalidRecord> {
    if holding.shares_held < 0 {
        return Err(InvalidRecord::NegativeShares(holding.shares_held));
    }
    let pct = holding.holding_percentage;
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(InvalidRecord::HoldingPercentageOutOfRange(pct));
    }
    Ok(())
}

fn validate_fund(fund: &Fund) -> Result<(), InvalidRecord> {
    match fund.total_assets {
        Some(v) if !v.is_finite() => {
            Err(InvalidRecord::NonFiniteValue("total assets".to_string()))
        }
        Some(v) if v < 0.0 => Err(InvalidRecord::NegativeTotalAssets(v)),
        _ => Ok(()),
    }
}

/// A fund that passed validation, with its usable holdings merged per stock.
struct AcceptedFund<'a> {
    fund: &'a Fund,
    assets: f64,
    /// Stock id to holding percentage, in first-seen order.
    weights: Vec<(&'a str, f64)>,
}

fn accept_funds<'a>(
    funds: &'a [FundWithHoldings],
    stocks: &StockUniverse,
    options: &OverlapOptions,
    warnings: &mut WarningLog,
    rejected: &mut Vec<RejectedRecord>,
    excluded: &mut Vec<String>,
) -> Vec<AcceptedFund<'a>> {
    let mut seen_funds = HashSet::new();
    let mut accepted = Vec::new();

    for entry in funds {
        let fund = &entry.fund;
        if !seen_funds.insert(fund.fund_id.as_str()) {
            warnings.push(DataQualityWarning::DuplicateFund {
                fund_id: fund.fund_id.clone(),
            });
            continue;
        }
        if !fund.is_active && !options.include_inactive {
            debug!(fund_id = %fund.fund_id, "Skipping inactive fund");
            excluded.push(fund.fund_id.clone());
            continue;
        }
        if let Err(reason) = validate_fund(fund) {
            rejected.push(RejectedRecord::new(fund.fund_id.clone(), reason));
            continue;
        }
        let assets = match fund.total_assets {
            Some(v) => v,
            None => {
                warnings.push(DataQualityWarning::MissingTotalAssets {
                    fund_id: fund.fund_id.clone(),
                });
                0.0
            }
        };

        let mut weights: Vec<(&str, f64)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut weight_sum = 0.0;
        for holding in &entry.holdings {
            if let Err(reason) = validate_holding(holding) {
                rejected.push(RejectedRecord::new(
                    format!("{}/{}", fund.fund_id, holding.stock_id),
                    reason,
                ));
                continue;
            }
            weight_sum += holding.holding_percentage;
            if !stocks.contains(&holding.stock_id) {
                warnings.push(DataQualityWarning::UnknownStock {
                    fund_id: fund.fund_id.clone(),
                    stock_id: holding.stock_id.clone(),
                });
                continue;
            }
            match positions.get(holding.stock_id.as_str()) {
                Some(&pos) => {
                    warnings.push(DataQualityWarning::DuplicateHolding {
                        fund_id: fund.fund_id.clone(),
                        stock_id: holding.stock_id.clone(),
                    });
                    weights[pos].1 += holding.holding_percentage;
                }
                None => {
                    positions.insert(holding.stock_id.as_str(), weights.len());
                    weights.push((holding.stock_id.as_str(), holding.holding_percentage));
                }
            }
        }

        if weight_sum > 100.0 + options.holding_sum_tolerance {
            warnings.push(DataQualityWarning::HoldingSumExceeded {
                fund_id: fund.fund_id.clone(),
                total: weight_sum,
            });
        }

        accepted.push(AcceptedFund {
            fund,
            assets,
            weights,
        });
    }

    accepted
}

fn pairwise_overlap(accepted: &[AcceptedFund<'_>]) -> Vec<FundPairOverlap> {
    let lookups: Vec<HashMap<&str, f64>> = accepted
        .iter()
        .map(|f| f.weights.iter().copied().collect())
        .collect();

    let mut pairs = Vec::new();
    for (i, a) in accepted.iter().enumerate() {
        for (j, b) in accepted.iter().enumerate().skip(i + 1) {
            let mut common_stocks = Vec::new();
            let mut overlap_pct = 0.0;
            for (stock_id, weight_a) in &a.weights {
                if let Some(weight_b) = lookups[j].get(stock_id) {
                    common_stocks.push(stock_id.to_string());
                    overlap_pct += weight_a.min(*weight_b);
                }
            }
            common_stocks.sort();
            pairs.push(FundPairOverlap {
                fund_a: a.fund.fund_id.clone(),
                fund_b: b.fund.fund_id.clone(),
                common_stocks,
                overlap_pct,
            });
        }
    }

    pairs.sort_by(|x, y| {
        y.overlap_pct
            .total_cmp(&x.overlap_pct)
            .then_with(|| x.fund_a.cmp(&y.fund_a))
            .then_with(|| x.fund_b.cmp(&y.fund_b))
    });
    pairs
}

/// Builds the stock-by-stock exposure report for a set of funds.
///
/// Exposure of a fund to a stock is `total_assets * holding_percentage / 100`.
/// Stocks held by a single fund stay in the report with `is_overlapping` unset.
/// Holdings of stocks missing from `stocks` are dropped with a warning, and
/// invalid funds or holdings are rejected individually.
pub fn detect_overlap(
    funds: &[FundWithHoldings],
    stocks: &StockUniverse,
    options: &OverlapOptions,
) -> OverlapReport {
    let mut warnings = WarningLog::default();
    let mut rejected = Vec::new();
    let mut excluded_funds = Vec::new();

    let accepted = accept_funds(
        funds,
        stocks,
        options,
        &mut warnings,
        &mut rejected,
        &mut excluded_funds,
    );

    // stock id -> (fund index, exposure), fund indices ascending
    let mut by_stock: HashMap<&str, Vec<(usize, f64)>> = HashMap::new();
    for (idx, fund) in accepted.iter().enumerate() {
        for (stock_id, pct) in &fund.weights {
            by_stock
                .entry(*stock_id)
                .or_default()
                .push((idx, fund.assets * pct / 100.0));
        }
    }

    let mut rows: Vec<OverlapRow> = by_stock
        .into_iter()
        .map(|(stock_id, exposures)| {
            let total_exposure: f64 = exposures.iter().map(|(_, e)| e).sum();
            let combined_assets: f64 = exposures.iter().map(|(i, _)| accepted[*i].assets).sum();
            let per_fund: Vec<FundExposure> = exposures
                .iter()
                .map(|(i, exposure)| FundExposure {
                    fund_id: accepted[*i].fund.fund_id.clone(),
                    exposure: *exposure,
                })
                .collect();
            OverlapRow {
                stock_id: stock_id.to_string(),
                stock_name: stocks.get(stock_id).map(|s| s.name.clone()),
                total_exposure,
                overlap_ratio: Ratio::of(total_exposure, combined_assets),
                is_overlapping: per_fund.len() >= 2,
                per_fund,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_exposure
            .total_cmp(&a.total_exposure)
            .then_with(|| a.stock_id.cmp(&b.stock_id))
    });

    let fund_pairs = pairwise_overlap(&accepted);
    debug!(
        funds = accepted.len(),
        stocks = rows.len(),
        overlapping = rows.iter().filter(|r| r.is_overlapping).count(),
        "Computed fund overlap"
    );

    OverlapReport {
        rows,
        fund_pairs,
        warnings: warnings.into_inner(),
        rejected,
        excluded_funds,
    }
}

/// Weight of `fund` invested in the given index constituents.
///
/// Invalid holdings are ignored here; they are reported by [`detect_overlap`].
pub fn index_coverage(fund: &FundWithHoldings, index_id: &str, members: &[String]) -> IndexCoverage {
    let members: HashSet<&str> = members.iter().map(String::as_str).collect();
    let mut covered_pct = 0.0;
    let mut covered_stocks = Vec::new();

    for holding in &fund.holdings {
        if validate_holding(holding).is_err() {
            continue;
        }
        if members.contains(holding.stock_id.as_str()) {
            covered_pct += holding.holding_percentage;
            if !covered_stocks.contains(&holding.stock_id) {
                covered_stocks.push(holding.stock_id.clone());
            }
        }
    }
    covered_stocks.sort();

    IndexCoverage {
        fund_id: fund.fund.fund_id.clone(),
        index_id: index_id.to_string(),
        covered_pct,
        covered_stocks,
    }
}
