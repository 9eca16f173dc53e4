//! Outcome markers shared by the aggregation functions.
//!
//! Nothing here aborts a computation. Undefined quotients become
//! [`Ratio::NotApplicable`], data problems become [`DataQualityWarning`]s and bad
//! records are set aside as [`RejectedRecord`]s next to the partial result.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;
use tracing::warn;

/// A quotient that may be undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Ratio {
    Value(f64),
    NotApplicable,
}

impl Ratio {
    /// `numerator / denominator`, or `NotApplicable` when the denominator is not
    /// strictly positive or the quotient is not finite.
    pub fn of(numerator: f64, denominator: f64) -> Self {
        if denominator <= 0.0 || !denominator.is_finite() {
            return Ratio::NotApplicable;
        }
        let value = numerator / denominator;
        if value.is_finite() {
            Ratio::Value(value)
        } else {
            Ratio::NotApplicable
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Ratio::Value(v) => Some(*v),
            Ratio::NotApplicable => None,
        }
    }

    /// Scales a defined value, e.g. by 100 for percentages.
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            Ratio::Value(v) => Ratio::Value(v * factor),
            Ratio::NotApplicable => Ratio::NotApplicable,
        }
    }
}

impl From<Option<f64>> for Ratio {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Ratio::Value(v),
            _ => Ratio::NotApplicable,
        }
    }
}

impl From<Ratio> for Option<f64> {
    fn from(ratio: Ratio) -> Self {
        ratio.value()
    }
}

impl Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ratio::Value(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v}"),
            },
            Ratio::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// Non-fatal data problems found while aggregating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataQualityWarning {
    HoldingSumExceeded { fund_id: String, total: f64 },
    UnknownStock { fund_id: String, stock_id: String },
    MissingTotalAssets { fund_id: String },
    DuplicateFund { fund_id: String },
    DuplicateHolding { fund_id: String, stock_id: String },
    MissingPrice { id: String },
}

impl Display for DataQualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataQualityWarning::HoldingSumExceeded { fund_id, total } => {
                write!(f, "holdings of fund {fund_id} add up to {total:.2}%")
            }
            DataQualityWarning::UnknownStock { fund_id, stock_id } => {
                write!(f, "fund {fund_id} holds unknown stock {stock_id}")
            }
            DataQualityWarning::MissingTotalAssets { fund_id } => {
                write!(f, "fund {fund_id} has no total assets, exposure counted as 0")
            }
            DataQualityWarning::DuplicateFund { fund_id } => {
                write!(f, "fund {fund_id} requested more than once")
            }
            DataQualityWarning::DuplicateHolding { fund_id, stock_id } => {
                write!(f, "fund {fund_id} lists stock {stock_id} more than once")
            }
            DataQualityWarning::MissingPrice { id } => {
                write!(f, "no current price for {id}")
            }
        }
    }
}

/// Why a single input record was left out of a computation.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum InvalidRecord {
    #[error("negative shares held: {0}")]
    NegativeShares(i64),
    #[error("negative current value: {0}")]
    NegativeValue(f64),
    #[error("negative invested amount: {0}")]
    NegativeInvested(f64),
    #[error("holding percentage {0} outside [0, 100]")]
    HoldingPercentageOutOfRange(f64),
    #[error("negative total assets: {0}")]
    NegativeTotalAssets(f64),
    #[error("non-finite {0}")]
    NonFiniteValue(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Identifies the record, e.g. `F1/S1` for a holding.
    pub record: String,
    pub reason: InvalidRecord,
}

impl RejectedRecord {
    pub fn new(record: impl Into<String>, reason: InvalidRecord) -> Self {
        let record = record.into();
        warn!(%record, %reason, "Rejected input record");
        Self { record, reason }
    }
}

impl Display for RejectedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.record, self.reason)
    }
}

/// Collects warnings in the order they were found, logging each one.
#[derive(Debug, Default)]
pub(crate) struct WarningLog {
    warnings: Vec<DataQualityWarning>,
}

impl WarningLog {
    pub(crate) fn push(&mut self, warning: DataQualityWarning) {
        warn!(%warning, "Data quality warning");
        self.warnings.push(warning);
    }

    pub(crate) fn into_inner(self) -> Vec<DataQualityWarning> {
        self.warnings
    }
}
