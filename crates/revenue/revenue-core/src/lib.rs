//! Revenue Forecast Core
//!
//! Core implementations for monthly revenue aggregation, linear and Holt
//! forecasting, smoothing parameter search, bootstrap confidence bands,
//! background execution and forecast orchestration.

pub mod aggregation;
pub mod bootstrap;
pub mod holt;
pub mod linear;
pub mod orchestrator;
pub mod request;
pub mod table;
pub mod task;
pub mod tuning;

// Re-export SPI types used throughout the core
pub use revenue_spi::{
    CancelFlag, CancelHandle, CancelableComputation, DateProbe, ForecastError, ForecastOutput,
    ForecastResult, Outcome, ParameterTuner, ProgressObserver, Result, TaskExecutor,
};

// Re-export main types
pub use aggregation::{coerce_revenue, ChronoDateProbe, SeriesAggregator};
pub use bootstrap::{apply_bands, percentile_band, BootstrapEngine};
pub use holt::{analytic_forecast, fit as holt_fit, HoltFit, HoltForecaster, HoltState};
pub use linear::{forecast_periods, linear_forecast, ols_fit, Z_95};
pub use orchestrator::{ForecastInput, ForecastOrchestrator};
pub use request::{LatestRequest, RequestKey};
pub use table::{ForecastRow, ForecastTable};
pub use task::{BlockingExecutor, InlineExecutor};
pub use tuning::{
    one_step_mse, tune_in_background, tuner_for, CoordinateDescentTuner, GridSearchTuner,
    NelderMeadTuner,
};
