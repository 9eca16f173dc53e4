//! Category and sector allocation.
//!
//! Groups keep the order in which their label was first seen so that chart
//! legends and tables come out the same on every run.
use crate::core::diagnostics::{InvalidRecord, Ratio, RejectedRecord};
use crate::core::valuation::{AssetKind, PortfolioEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use tracing::debug;

/// Label used for entries without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Equity,
    Debt,
    Hybrid,
    Other,
}

impl From<&str> for AssetClass {
    fn from(s: &str) -> Self {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "equity" | "stock" | "elss" | "index" => AssetClass::Equity,
            "debt" | "income" | "fixed income" | "liquid" | "gilt" => AssetClass::Debt,
            "hybrid" | "balanced" | "dynamic" => AssetClass::Hybrid,
            _ if s.starts_with("equity") => AssetClass::Equity,
            _ if s.starts_with("debt") => AssetClass::Debt,
            _ if s.starts_with("hybrid") => AssetClass::Hybrid,
            _ => AssetClass::Other,
        }
    }
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AssetClass::Equity => "Equity",
            AssetClass::Debt => "Debt",
            AssetClass::Hybrid => "Hybrid",
            AssetClass::Other => "Other",
        };
        write!(f, "{name}")
    }
}

/// One value to be bucketed under a category label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub category: Option<String>,
    pub value: f64,
}

impl AllocationEntry {
    pub fn new(category: Option<&str>, value: f64) -> Self {
        Self {
            category: category.map(str::to_string),
            value,
        }
    }

    /// Buckets a portfolio entry by its raw category label.
    pub fn by_category(entry: &PortfolioEntry) -> Self {
        Self {
            category: entry.category.clone(),
            value: entry.current_value,
        }
    }

    /// Buckets a portfolio entry by its normalised asset class. Stocks are
    /// always equity.
    pub fn by_asset_class(entry: &PortfolioEntry) -> Self {
        let class = match entry.kind {
            AssetKind::Stock => AssetClass::Equity,
            AssetKind::Fund => entry
                .category
                .as_deref()
                .map(AssetClass::from)
                .unwrap_or(AssetClass::Other),
        };
        Self {
            category: Some(class.to_string()),
            value: entry.current_value,
        }
    }

    fn label(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label,
            _ => UNCATEGORIZED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationGroup {
    pub label: String,
    pub aggregate_value: f64,
    /// Fraction of the total value, 0 to 1.
    pub share: Ratio,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Groups in first-seen order.
    pub groups: Vec<AllocationGroup>,
    pub total_value: f64,
    pub rejected: Vec<RejectedRecord>,
}

impl Allocation {
    pub fn get(&self, label: &str) -> Option<&AllocationGroup> {
        self.groups.iter().find(|g| g.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.label.as_str()).collect()
    }

    /// Groups by value descending. The sort is stable, so equal values keep
    /// first-seen order.
    pub fn sorted_by_value(&self) -> Vec<&AllocationGroup> {
        let mut groups: Vec<_> = self.groups.iter().collect();
        groups.sort_by(|a, b| b.aggregate_value.total_cmp(&a.aggregate_value));
        groups
    }
}

/// Sums values per category label.
///
/// Negative or non-finite values are rejected and left out of both the groups
/// and the total.
pub fn allocate(entries: &[AllocationEntry]) -> Allocation {
    let mut groups: Vec<AllocationGroup> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut rejected = Vec::new();
    let mut total_value = 0.0;

    for (i, entry) in entries.iter().enumerate() {
        let label = entry.label();
        if !entry.value.is_finite() {
            rejected.push(RejectedRecord::new(
                format!("{label}#{i}"),
                InvalidRecord::NonFiniteValue("value".to_string()),
            ));
            continue;
        }
        if entry.value < 0.0 {
            rejected.push(RejectedRecord::new(
                format!("{label}#{i}"),
                InvalidRecord::NegativeValue(entry.value),
            ));
            continue;
        }

        let pos = *positions.entry(label.to_string()).or_insert_with(|| {
            groups.push(AllocationGroup {
                label: label.to_string(),
                aggregate_value: 0.0,
                share: Ratio::NotApplicable,
                count: 0,
            });
            groups.len() - 1
        });
        groups[pos].aggregate_value += entry.value;
        groups[pos].count += 1;
        total_value += entry.value;
    }

    for group in &mut groups {
        group.share = Ratio::of(group.aggregate_value, total_value);
    }
    debug!(groups = groups.len(), total_value, "Allocated entries");

    Allocation {
        groups,
        total_value,
        rejected,
    }
}
