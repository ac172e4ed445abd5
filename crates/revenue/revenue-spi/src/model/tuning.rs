//! Smoothing parameter models

use serde::{Deserialize, Serialize};

/// Lower bound for tuned and clamped smoothing parameters.
pub const PARAM_MIN: f64 = 0.01;
/// Upper bound for tuned and clamped smoothing parameters.
pub const PARAM_MAX: f64 = 0.99;

/// Holt smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoltParams {
    pub alpha: f64,
    pub beta: f64,
}

impl HoltParams {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Both parameters clamped into `[0.01, 0.99]`.
    pub fn clamped(self) -> Self {
        Self {
            alpha: clamp_param(self.alpha),
            beta: clamp_param(self.beta),
        }
    }
}

impl Default for HoltParams {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.2,
        }
    }
}

/// Clamp a smoothing parameter into `[0.01, 0.99]`; NaN maps to the lower bound.
pub fn clamp_param(value: f64) -> f64 {
    if value.is_nan() {
        return PARAM_MIN;
    }
    value.clamp(PARAM_MIN, PARAM_MAX)
}

/// Outcome of a parameter search. `score` is the one-step-ahead MSE.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningResult {
    pub alpha: f64,
    pub beta: f64,
    pub score: f64,
}

impl TuningResult {
    /// Result returned when the series is too short to tune.
    pub fn fallback() -> Self {
        Self {
            alpha: 0.6,
            beta: 0.2,
            score: f64::INFINITY,
        }
    }

    pub fn params(&self) -> HoltParams {
        HoltParams::new(self.alpha, self.beta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_param() {
        assert_eq!(clamp_param(-1.0), 0.01);
        assert_eq!(clamp_param(1.5), 0.99);
        assert_eq!(clamp_param(0.3), 0.3);
        assert_eq!(clamp_param(f64::NAN), 0.01);
    }

    #[test]
    fn test_fallback() {
        let result = TuningResult::fallback();
        assert_eq!(result.params(), HoltParams::new(0.6, 0.2));
        assert!(result.score.is_infinite());
    }

    #[test]
    fn test_default_params() {
        assert_eq!(HoltParams::default(), HoltParams::new(0.5, 0.2));
        assert_eq!(HoltParams::new(0.0, 2.0).clamped(), HoltParams::new(0.01, 0.99));
    }
}
