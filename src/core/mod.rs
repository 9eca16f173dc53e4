//! Core business logic: the aggregation engine and its abstractions

pub mod allocation;
pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod log;
pub mod market;
pub mod model;
pub mod overlap;
pub mod portfolio;
pub mod valuation;

// Re-export main types for cleaner imports
pub use allocation::{Allocation, AllocationEntry, AssetClass, allocate};
pub use diagnostics::{DataQualityWarning, InvalidRecord, Ratio, RejectedRecord};
pub use market::MarketDataProvider;
pub use model::{Fund, FundWithHoldings, Holding, Index, MarketSnapshot, Stock, StockUniverse};
pub use overlap::{OverlapOptions, OverlapReport, detect_overlap, index_coverage};
pub use valuation::{AssetKind, PortfolioEntry, ValuationResult, valuate};
