//! Revenue Forecast Facade
//!
//! High-level API for subscription revenue forecasting. Re-exports all
//! public types from the revenue stack for convenient usage.
//!
//! ```rust,no_run
//! use revenue_facade::{ForecastConfigBuilder, ForecastOrchestrator, RawRecord};
//!
//! let records = vec![
//!     RawRecord::new().with("id", "a").with("MRR", 100).with("date", "2024-01-05"),
//!     RawRecord::new().with("id", "a").with("MRR", 120).with("date", "2024-02-05"),
//! ];
//! let config = ForecastConfigBuilder::new().holt().horizon(6).build();
//! let output = ForecastOrchestrator::new()
//!     .compute_forecast(records, &config)
//!     .into_ready();
//! ```

// Data model, contracts and errors
pub use revenue_spi::*;

// Configuration
pub use revenue_api::prelude;
pub use revenue_api::{
    AggregationConfig, ForecastConfig, ForecastConfigBuilder, ForecastMethod, HoltOptions,
    SmoothingParam, TunerStrategy, DEFAULT_BOOTSTRAP_SAMPLES, DEFAULT_HORIZON,
};

// Re-export core modules for direct access
pub use revenue_core::{
    aggregation, bootstrap, holt, linear, orchestrator, request, table, task, tuning,
};

// Re-export main types at root
pub use revenue_core::{
    analytic_forecast, apply_bands, coerce_revenue, forecast_periods, holt_fit, linear_forecast,
    ols_fit, one_step_mse, percentile_band, tune_in_background, tuner_for, BlockingExecutor,
    BootstrapEngine, ChronoDateProbe, CoordinateDescentTuner, ForecastInput,
    ForecastOrchestrator, ForecastRow, ForecastTable, GridSearchTuner, HoltFit, HoltForecaster,
    HoltState, InlineExecutor, LatestRequest, NelderMeadTuner, RequestKey, SeriesAggregator,
    Z_95,
};
