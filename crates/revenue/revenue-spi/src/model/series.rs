//! Monthly series model

use crate::model::YearMonth;
use serde::{Deserialize, Serialize};

/// One month of aggregated revenue with its movement decomposition.
///
/// `total` is the sum of each entity's latest value in the month. `new`,
/// `expansion` and `churn` describe the movement from the previous month
/// present in the series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeriesPoint {
    pub period: YearMonth,
    pub total: f64,
    #[serde(default)]
    pub new: f64,
    #[serde(default)]
    pub expansion: f64,
    #[serde(default)]
    pub churn: f64,
}

impl MonthlySeriesPoint {
    /// A point carrying only a total, with no movement breakdown.
    pub fn total_only(period: YearMonth, total: f64) -> Self {
        Self {
            period,
            total,
            new: 0.0,
            expansion: 0.0,
            churn: 0.0,
        }
    }

    /// Net movement: `new + expansion - churn`.
    pub fn net_change(&self) -> f64 {
        self.new + self.expansion - self.churn
    }
}
