//! Forecast configuration types.
//!
//! All types deserialize permissively from JSON: missing fields take their
//! defaults and the camelCase names used by browser callers are accepted as
//! aliases. Out-of-range values are clamped when they are used, not rejected.

use revenue_spi::{clamp_param, ForecastError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Default number of months to forecast.
pub const DEFAULT_HORIZON: usize = 12;
/// Default number of bootstrap trials.
pub const DEFAULT_BOOTSTRAP_SAMPLES: usize = 200;

// ============================================================================
// Method / tuner selection
// ============================================================================

/// Which forecaster to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMethod {
    /// Ordinary least squares trend
    #[default]
    Linear,
    /// Holt linear (double exponential) smoothing
    Holt,
}

impl FromStr for ForecastMethod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(ForecastMethod::Linear),
            "holt" => Ok(ForecastMethod::Holt),
            other => Err(ForecastError::InvalidInput(format!(
                "unknown forecast method '{}'",
                other
            ))),
        }
    }
}

/// Search used when a smoothing parameter is `auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunerStrategy {
    /// Coordinate descent with shrinking steps
    #[default]
    Fast,
    /// Nelder-Mead simplex
    Advanced,
    /// Exhaustive alpha x beta grid
    Grid,
}

impl FromStr for TunerStrategy {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(TunerStrategy::Fast),
            "advanced" | "nelder-mead" => Ok(TunerStrategy::Advanced),
            "grid" => Ok(TunerStrategy::Grid),
            other => Err(ForecastError::InvalidInput(format!(
                "unknown tuner strategy '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// Smoothing parameters
// ============================================================================

/// A Holt smoothing parameter: tuned automatically or fixed.
///
/// Serialized as the string `"auto"` or as a number.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SmoothingParam {
    #[default]
    Auto,
    Fixed(f64),
}

impl SmoothingParam {
    pub fn is_auto(&self) -> bool {
        matches!(self, SmoothingParam::Auto)
    }

    /// The fixed value clamped into `[0.01, 0.99]`, or `None` for `Auto`.
    pub fn resolve(&self) -> Option<f64> {
        match *self {
            SmoothingParam::Auto => None,
            SmoothingParam::Fixed(value) => {
                let clamped = clamp_param(value);
                if clamped != value {
                    tracing::warn!(value, clamped, "smoothing parameter out of range, clamped");
                }
                Some(clamped)
            }
        }
    }
}

impl From<f64> for SmoothingParam {
    fn from(value: f64) -> Self {
        SmoothingParam::Fixed(value)
    }
}

impl FromStr for SmoothingParam {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(SmoothingParam::Auto);
        }
        trimmed
            .parse::<f64>()
            .map(SmoothingParam::Fixed)
            .map_err(|_| {
                ForecastError::InvalidInput(format!(
                    "smoothing parameter must be 'auto' or a number, got '{}'",
                    trimmed
                ))
            })
    }
}

impl Serialize for SmoothingParam {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SmoothingParam::Auto => serializer.serialize_str("auto"),
            SmoothingParam::Fixed(value) => serializer.serialize_f64(*value),
        }
    }
}

impl<'de> Deserialize<'de> for SmoothingParam {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
            Missing(()),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(SmoothingParam::Fixed(value)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Repr::Missing(()) => Ok(SmoothingParam::Auto),
        }
    }
}

// ============================================================================
// Counts
// ============================================================================

/// Deserialize a count from an integer, a float or a numeric string,
/// clamping it to at least one. Fractions are truncated.
fn deserialize_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Text(String),
    }

    let value = match Repr::deserialize(deserializer)? {
        Repr::Unsigned(value) => value as f64,
        Repr::Signed(value) => value as f64,
        Repr::Float(value) => value,
        Repr::Text(text) => text.trim().parse::<f64>().map_err(|_| {
            serde::de::Error::custom(format!("expected a count, got '{}'", text))
        })?,
    };

    if value.is_nan() || value < 1.0 {
        tracing::warn!(value, "count below 1, using 1");
        return Ok(1);
    }
    Ok(value.min(usize::MAX as f64) as usize)
}

// ============================================================================
// Holt options
// ============================================================================

/// Options for the Holt forecaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoltOptions {
    /// Level smoothing
    pub alpha: SmoothingParam,
    /// Trend smoothing
    pub beta: SmoothingParam,
    /// Search used when either parameter is `auto`
    pub tuner: TunerStrategy,
    /// Replace the analytic band with bootstrap percentiles
    pub bootstrap: bool,
    /// Number of bootstrap trials
    #[serde(alias = "bootstrapSamples", deserialize_with = "deserialize_count")]
    pub bootstrap_samples: usize,
    /// Run the bootstrap as a cancelable background computation
    #[serde(alias = "bootstrapAsync")]
    pub bootstrap_async: bool,
    /// Seed for bootstrap resampling; entropy when absent
    pub seed: Option<u64>,
    /// Include in-sample residuals in the result
    #[serde(alias = "returnResiduals")]
    pub return_residuals: bool,
}

impl Default for HoltOptions {
    fn default() -> Self {
        Self {
            alpha: SmoothingParam::Auto,
            beta: SmoothingParam::Auto,
            tuner: TunerStrategy::Fast,
            bootstrap: false,
            bootstrap_samples: DEFAULT_BOOTSTRAP_SAMPLES,
            bootstrap_async: false,
            seed: None,
            return_residuals: false,
        }
    }
}

impl HoltOptions {
    /// Fixed parameters; `None` when either one is `auto`.
    pub fn fixed_params(&self) -> Option<(f64, f64)> {
        Some((self.alpha.resolve()?, self.beta.resolve()?))
    }

    /// Bootstrap trial count, at least one.
    pub fn samples(&self) -> usize {
        if self.bootstrap_samples == 0 {
            tracing::warn!("bootstrap_samples is 0, using 1");
        }
        self.bootstrap_samples.max(1)
    }

    /// Whether the call should return a pending computation.
    pub fn runs_async(&self) -> bool {
        self.bootstrap && self.bootstrap_async
    }
}

// ============================================================================
// Forecast configuration
// ============================================================================

/// Top-level forecast request configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub method: ForecastMethod,
    /// Months to forecast
    #[serde(alias = "monthsOut", deserialize_with = "deserialize_count")]
    pub horizon: usize,
    #[serde(alias = "holtOptions")]
    pub holt: HoltOptions,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            method: ForecastMethod::Linear,
            horizon: DEFAULT_HORIZON,
            holt: HoltOptions::default(),
        }
    }
}

impl ForecastConfig {
    /// Horizon clamped to at least one month.
    pub fn effective_horizon(&self) -> usize {
        if self.horizon == 0 {
            tracing::warn!("horizon is 0, forecasting 1 month");
        }
        self.horizon.max(1)
    }
}

// ============================================================================
// Aggregation configuration
// ============================================================================

/// Which record fields carry the date, the entity id and the revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Date fields tried in priority order before scanning every field
    pub date_fields: Vec<String>,
    /// Entity id fields tried in order
    pub id_fields: Vec<String>,
    /// Revenue fields tried in order
    pub revenue_fields: Vec<String>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            date_fields: owned(&[
                "date",
                "month",
                "created_at",
                "createdAt",
                "uploadedAt",
                "start_date",
                "signupDate",
            ]),
            id_fields: owned(&["id", "name"]),
            revenue_fields: owned(&["MRR", "mrr", "revenue", "amount", "value"]),
        }
    }
}
