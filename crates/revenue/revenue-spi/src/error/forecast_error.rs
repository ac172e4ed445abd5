//! Forecast error types

use thiserror::Error;

/// Errors that can occur during forecasting operations.
///
/// Missing or unusable data is never an error: aggregation and the
/// forecasters signal it with `None`. These variants cover the background
/// computation path and the input/export surfaces.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// The computation was cancelled before its result was observed
    #[error("Computation cancelled")]
    Cancelled,

    /// The background task failed or its executor went away
    #[error("Background task failed: {0}")]
    TaskFailed(String),

    /// Input could not be interpreted
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Writing a forecast table failed
    #[error("Export failed: {0}")]
    Export(String),
}
