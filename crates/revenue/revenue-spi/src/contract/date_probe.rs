//! Trait for recognising calendar dates in record fields

use crate::model::YearMonth;
use serde_json::Value;

/// Capability check: does this field value denote a calendar date, and if
/// so, which month does it fall in?
pub trait DateProbe: Send + Sync {
    fn probe(&self, value: &Value) -> Option<YearMonth>;
}

impl<F> DateProbe for F
where
    F: Fn(&Value) -> Option<YearMonth> + Send + Sync,
{
    fn probe(&self, value: &Value) -> Option<YearMonth> {
        self(value)
    }
}
