//! Revenue Forecast Service Provider Interface
//!
//! Defines the data model, error type and contracts shared by the revenue
//! aggregation and forecasting stack: raw records, calendar months, monthly
//! series, forecast points, tuning results, cancelable computations and the
//! traits for date probing, parameter tuning, task execution and progress.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{DateProbe, ParameterTuner, ProgressObserver, TaskExecutor};
pub use error::{ForecastError, Result};
pub use model::{
    BootstrapBand, CancelFlag, CancelHandle, CancelableComputation, ForecastOutput, ForecastPoint,
    ForecastResult, HoltFitState, HoltForecast, HoltParams, LinearForecast, MonthlySeriesPoint,
    Outcome, Progress, RawRecord, TuningResult, YearMonth, clamp_param, PARAM_MAX, PARAM_MIN,
};
