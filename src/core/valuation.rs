//! Portfolio totals: invested, current, profit/loss and return.
use crate::core::diagnostics::{InvalidRecord, Ratio, RejectedRecord};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Fund,
    Stock,
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Fund => write!(f, "Fund"),
            AssetKind::Stock => write!(f, "Stock"),
        }
    }
}

/// A user's position in one fund or stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub id: String,
    pub name: String,
    pub kind: AssetKind,
    pub category: Option<String>,
    pub invested_amount: f64,
    pub current_value: f64,
}

impl PortfolioEntry {
    pub fn profit_loss(&self) -> f64 {
        self.current_value - self.invested_amount
    }

    /// Return on the invested amount, in percent.
    pub fn return_pct(&self) -> Ratio {
        Ratio::of(self.profit_loss(), self.invested_amount).scaled(100.0)
    }

    fn validate(&self) -> Result<(), InvalidRecord> {
        if !self.invested_amount.is_finite() {
            return Err(InvalidRecord::NonFiniteValue("invested amount".to_string()));
        }
        if !self.current_value.is_finite() {
            return Err(InvalidRecord::NonFiniteValue("current value".to_string()));
        }
        if self.invested_amount < 0.0 {
            return Err(InvalidRecord::NegativeInvested(self.invested_amount));
        }
        if self.current_value < 0.0 {
            return Err(InvalidRecord::NegativeValue(self.current_value));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub total_invested: f64,
    pub total_current: f64,
    pub profit_loss: f64,
    /// `profit_loss / total_invested * 100`, undefined when nothing is invested.
    pub return_pct: Ratio,
    /// Number of entries that made it into the totals.
    pub counted: usize,
    pub rejected: Vec<RejectedRecord>,
}

/// Sums a sequence of portfolio entries.
///
/// Entries with negative or non-finite amounts are rejected one by one and the
/// rest are still totalled. An empty input gives zero totals and an undefined
/// return.
pub fn valuate(entries: &[PortfolioEntry]) -> ValuationResult {
    let mut total_invested = 0.0;
    let mut total_current = 0.0;
    let mut counted = 0;
    let mut rejected = Vec::new();

    for entry in entries {
        if let Err(reason) = entry.validate() {
            rejected.push(RejectedRecord::new(entry.id.clone(), reason));
            continue;
        }
        total_invested += entry.invested_amount;
        total_current += entry.current_value;
        counted += 1;
    }

    let profit_loss = total_current - total_invested;
    let return_pct = Ratio::of(profit_loss, total_invested).scaled(100.0);
    debug!(
        total_invested,
        total_current,
        counted,
        rejected = rejected.len(),
        "Valuated portfolio entries"
    );

    ValuationResult {
        total_invested,
        total_current,
        profit_loss,
        return_pct,
        counted,
        rejected,
    }
}

#[cfg(test)]
pub(crate) fn entry(id: &str, category: Option<&str>, invested: f64, current: f64) -> PortfolioEntry {
    PortfolioEntry {
        id: id.to_string(),
        name: id.to_string(),
        kind: AssetKind::Fund,
        category: category.map(str::to_string),
        invested_amount: invested,
        current_value: current,
    }
}
