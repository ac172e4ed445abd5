//! Forecast result models

use crate::model::{MonthlySeriesPoint, YearMonth};
use serde::{Deserialize, Serialize};

/// A single forecast month with its confidence band.
///
/// All three values are non-negative and `lower <= predicted <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period: YearMonth,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastPoint {
    /// Build a point, flooring every value at zero and widening the band
    /// so it always contains the prediction.
    pub fn bounded(period: YearMonth, predicted: f64, lower: f64, upper: f64) -> Self {
        let predicted = predicted.max(0.0);
        Self {
            period,
            predicted,
            lower: lower.max(0.0).min(predicted),
            upper: upper.max(0.0).max(predicted),
        }
    }

    /// Band width (`upper - lower`).
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Empirical band for one horizon step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapBand {
    pub lower: f64,
    pub upper: f64,
}

/// Fitted Holt state after the in-sample pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoltFitState {
    pub level: f64,
    pub trend: f64,
    pub residual_std: f64,
    pub alpha: f64,
    pub beta: f64,
}

/// Ordinary least squares trend forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearForecast {
    pub slope: f64,
    pub intercept: f64,
    pub residual_std: f64,
    pub forecast: Vec<ForecastPoint>,
}

/// Holt linear smoothing forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoltForecast {
    #[serde(flatten)]
    pub state: HoltFitState,
    pub forecast: Vec<ForecastPoint>,
    /// Number of bootstrap trials behind the bands, when bootstrap was used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_samples: Option<usize>,
    /// In-sample one-step residuals, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residuals: Option<Vec<f64>>,
}

/// Result of whichever forecaster ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum ForecastResult {
    Linear(LinearForecast),
    Holt(HoltForecast),
}

impl ForecastResult {
    pub fn forecast(&self) -> &[ForecastPoint] {
        match self {
            ForecastResult::Linear(linear) => &linear.forecast,
            ForecastResult::Holt(holt) => &holt.forecast,
        }
    }

    pub fn residual_std(&self) -> f64 {
        match self {
            ForecastResult::Linear(linear) => linear.residual_std,
            ForecastResult::Holt(holt) => holt.state.residual_std,
        }
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            ForecastResult::Linear(_) => "linear",
            ForecastResult::Holt(_) => "holt",
        }
    }
}

/// Orchestrator output: the series that was forecast and the forecast itself.
///
/// `forecast_result` is `None` when there was not enough data to forecast.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastOutput {
    pub monthly_series: Vec<MonthlySeriesPoint>,
    pub forecast_result: Option<ForecastResult>,
}

impl ForecastOutput {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan() -> YearMonth {
        YearMonth::new(2024, 1).unwrap()
    }

    #[test]
    fn test_bounded_floors_at_zero() {
        let point = ForecastPoint::bounded(jan(), -5.0, -20.0, 10.0);
        assert_eq!(point.predicted, 0.0);
        assert_eq!(point.lower, 0.0);
        assert_eq!(point.upper, 10.0);
    }

    #[test]
    fn test_bounded_widens_to_contain_prediction() {
        let point = ForecastPoint::bounded(jan(), 100.0, 110.0, 130.0);
        assert_eq!(point.lower, 100.0);
        assert!(point.lower <= point.predicted && point.predicted <= point.upper);

        let point = ForecastPoint::bounded(jan(), 100.0, 80.0, 90.0);
        assert_eq!(point.upper, 100.0);
    }

    #[test]
    fn test_forecast_result_is_tagged_by_method() {
        let result = ForecastResult::Linear(LinearForecast {
            slope: 20.0,
            intercept: 100.0,
            residual_std: 0.0,
            forecast: vec![ForecastPoint::bounded(jan(), 160.0, 160.0, 160.0)],
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["method"], "linear");
        assert_eq!(json["forecast"][0]["period"], "2024-01");
        assert_eq!(result.forecast().len(), 1);
        assert_eq!(result.method_name(), "linear");
    }

    #[test]
    fn test_holt_state_is_flattened() {
        let result = HoltForecast {
            state: HoltFitState {
                level: 150.0,
                trend: 10.0,
                residual_std: 2.0,
                alpha: 0.6,
                beta: 0.2,
            },
            forecast: vec![],
            bootstrap_samples: None,
            residuals: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["level"], 150.0);
        assert_eq!(json["alpha"], 0.6);
        assert!(json.get("bootstrap_samples").is_none());
    }

    #[test]
    fn test_empty_output() {
        let output = ForecastOutput::empty();
        assert!(output.monthly_series.is_empty());
        assert!(output.forecast_result.is_none());
    }
}
