//! Smoothing parameter search
//!
//! Three interchangeable [`ParameterTuner`] strategies minimizing the same
//! objective, the one-step-ahead MSE of Holt's recurrence:
//!
//! - **Fast**: [`CoordinateDescentTuner`]
//! - **Advanced**: [`NelderMeadTuner`]
//! - **Grid**: [`GridSearchTuner`]
//!
//! All three are deterministic and free of shared state.

mod coordinate;
mod grid;
mod nelder_mead;
mod objective;

pub use coordinate::CoordinateDescentTuner;
pub use grid::GridSearchTuner;
pub use nelder_mead::NelderMeadTuner;
pub use objective::one_step_mse;

use revenue_api::TunerStrategy;
use revenue_spi::{
    CancelableComputation, HoltParams, ParameterTuner, ProgressObserver, TaskExecutor,
    TuningResult,
};
use std::sync::Arc;

/// The tuner for a strategy, starting from `start` where the strategy uses one.
pub fn tuner_for(strategy: TunerStrategy, start: HoltParams) -> Box<dyn ParameterTuner> {
    match strategy {
        TunerStrategy::Fast => Box::new(CoordinateDescentTuner::new().with_start(start)),
        TunerStrategy::Advanced => Box::new(NelderMeadTuner::new().with_start(start)),
        TunerStrategy::Grid => Box::new(GridSearchTuner::new()),
    }
}

/// Run a tuner as a cancelable computation on `executor`.
///
/// Progress is reported to `observer` from whichever thread runs the search.
pub fn tune_in_background<E: TaskExecutor>(
    executor: &E,
    series: Vec<f64>,
    strategy: TunerStrategy,
    observer: Option<Arc<dyn ProgressObserver>>,
) -> CancelableComputation<TuningResult> {
    executor.submit(move |cancel| {
        let tuner = tuner_for(strategy, HoltParams::default());
        tracing::debug!(tuner = tuner.name(), points = series.len(), "background tuning started");
        tuner.tune_cancelable(&series, observer.as_deref(), cancel)
    })
}
