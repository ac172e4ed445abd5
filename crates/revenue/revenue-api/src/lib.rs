//! Revenue Forecast Consumer API
//!
//! Configuration types and builders for the forecasting engine.
//!
//! This crate provides:
//! - Method, smoothing parameter and tuner selection
//! - Holt and bootstrap options
//! - Aggregation field configuration
//! - A builder for assembling a [`ForecastConfig`]

pub mod builder;
pub mod config;

pub use builder::ForecastConfigBuilder;
pub use config::{
    AggregationConfig, ForecastConfig, ForecastMethod, HoltOptions, SmoothingParam,
    TunerStrategy, DEFAULT_BOOTSTRAP_SAMPLES, DEFAULT_HORIZON,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::builder::ForecastConfigBuilder;
    pub use crate::config::{
        AggregationConfig, ForecastConfig, ForecastMethod, HoltOptions, SmoothingParam,
        TunerStrategy,
    };
}
