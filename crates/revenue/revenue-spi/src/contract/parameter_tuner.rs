//! Trait for smoothing parameter search

use crate::contract::ProgressObserver;
use crate::error::Result;
use crate::model::{CancelFlag, TuningResult};

/// Selects Holt `(alpha, beta)` minimizing one-step-ahead MSE over a series.
///
/// Implementations are deterministic and side-effect free apart from
/// progress callbacks.
pub trait ParameterTuner: Send + Sync {
    /// Run the search, reporting to `observer` and stopping with
    /// `Err(Cancelled)` once `cancel` is raised.
    fn tune_cancelable(
        &self,
        series: &[f64],
        observer: Option<&dyn ProgressObserver>,
        cancel: &CancelFlag,
    ) -> Result<TuningResult>;

    /// Strategy name, for logs.
    fn name(&self) -> &'static str;

    /// Run the search to completion.
    fn tune(&self, series: &[f64]) -> TuningResult {
        self.tune_cancelable(series, None, &CancelFlag::new())
            .unwrap_or_else(|_| TuningResult::fallback())
    }
}
