//! Market data records as the engine sees them.
//!
//! Numeric fields that the data layer may leave empty are `Option`s. Nothing in
//! here is mutated by the engine; records are replaced wholesale on refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub stock_id: String,
    pub isin: Option<String>,
    pub symbol: Option<String>,
    pub name: String,
    pub sector: Option<String>,
    pub exchange: Option<String>,
    pub market_cap: Option<f64>,
    pub current_price: Option<f64>,
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    /// Index ids this stock belongs to, as reported by the provider.
    #[serde(default)]
    pub indices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    pub fund_id: String,
    pub name: String,
    pub amc_id: Option<String>,
    pub fund_type: Option<String>,
    pub nav: Option<f64>,
    pub expense_ratio: Option<f64>,
    /// Assets under management.
    pub total_assets: Option<f64>,
    pub manager_name: Option<String>,
    pub is_active: bool,
}

/// One stock position inside a fund.
///
/// `shares_held` is signed so that bad upstream rows survive deserialization and
/// can be rejected per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub stock_id: String,
    pub shares_held: i64,
    /// Share of the fund's AUM in this stock, 0 to 100.
    pub holding_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub index_id: String,
    pub name: String,
    pub category: Option<String>,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub ltp: Option<f64>,
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundWithHoldings {
    pub fund: Fund,
    pub holdings: Vec<Holding>,
}

impl FundWithHoldings {
    pub fn new(fund: Fund, holdings: Vec<Holding>) -> Self {
        Self { fund, holdings }
    }
}

/// The set of stocks known to the market data provider for one refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct StockUniverse {
    by_id: HashMap<String, Stock>,
}

impl StockUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stock: Stock) {
        self.by_id.insert(stock.stock_id.clone(), stock);
    }

    pub fn get(&self, stock_id: &str) -> Option<&Stock> {
        self.by_id.get(stock_id)
    }

    pub fn contains(&self, stock_id: &str) -> bool {
        self.by_id.contains_key(stock_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Ids of every stock that lists `index_id` among its indices.
    pub fn members_of(&self, index_id: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .by_id
            .values()
            .filter(|s| s.indices.iter().any(|i| i == index_id))
            .map(|s| s.stock_id.clone())
            .collect();
        members.sort();
        members
    }
}

impl FromIterator<Stock> for StockUniverse {
    fn from_iter<I: IntoIterator<Item = Stock>>(iter: I) -> Self {
        let mut universe = StockUniverse::new();
        for stock in iter {
            universe.insert(stock);
        }
        universe
    }
}

/// A fully resolved, consistent view of market data for one request.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub stocks: StockUniverse,
    pub funds: Vec<Fund>,
    pub holdings: HashMap<String, Vec<Holding>>,
    pub indices: Vec<Index>,
    pub fetched_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn fund(&self, fund_id: &str) -> Option<&Fund> {
        self.funds.iter().find(|f| f.fund_id == fund_id)
    }

    /// Pairs each requested fund with its holdings, in the order given.
    ///
    /// Ids that the provider does not know are skipped. A fund whose holdings
    /// were never fetched is paired with an empty list.
    pub fn funds_with_holdings(&self, fund_ids: &[String]) -> Vec<FundWithHoldings> {
        fund_ids
            .iter()
            .filter_map(|id| self.fund(id))
            .map(|fund| {
                let holdings = self
                    .holdings
                    .get(&fund.fund_id)
                    .cloned()
                    .unwrap_or_default();
                FundWithHoldings::new(fund.clone(), holdings)
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_members_of_index() {
        let mut a = stock("A");
        a.indices = vec!["NIFTY50".to_string()];
        let mut b = stock("B");
        b.indices = vec!["NIFTY50".to_string(), "BANKNIFTY".to_string()];
        let universe: StockUniverse = vec![b, a, stock("C")].into_iter().collect();

        assert_eq!(universe.members_of("NIFTY50"), vec!["A", "B"]);
        assert_eq!(universe.members_of("BANKNIFTY"), vec!["B"]);
        assert!(universe.members_of("MIDCAP").is_empty());
    }

    #[test]
    fn test_funds_with_holdings_keeps_requested_order() {
        let mut holdings = HashMap::new();
        holdings.insert("F2".to_string(), vec![holding("A", 10.0)]);
        let snapshot = MarketSnapshot {
            stocks: universe(&["A"]),
            funds: vec![fund("F1", Some(100.0)), fund("F2", Some(200.0))],
            holdings,
            indices: Vec::new(),
            fetched_at: Utc::now(),
        };

        let ids = vec!["F2".to_string(), "MISSING".to_string(), "F1".to_string()];
        let paired = snapshot.funds_with_holdings(&ids);

        assert_eq!(paired.len(), 2);
        assert_eq!(paired[0].fund.fund_id, "F2");
        assert_eq!(paired[0].holdings.len(), 1);
        assert_eq!(paired[1].fund.fund_id, "F1");
        assert!(paired[1].holdings.is_empty());
    }
}
