//! Holt linear (double exponential) smoothing forecaster
//!
//! Recurrence, with `level_0 = y_0` and `trend_0 = y_1 - y_0`:
//!
//! ```text
//! forecast_t = level_{t-1} + trend_{t-1}
//! level_t    = α·y_t + (1 - α)·(level_{t-1} + trend_{t-1})
//! trend_t    = β·(level_t - level_{t-1}) + (1 - β)·trend_{t-1}
//! ```
//!
//! The h-step forecast is `level + h·trend` with an analytic band of
//! `± 1.96 · residual_std`, or bootstrap percentile bands when requested.

use crate::bootstrap::{apply_bands, BootstrapEngine};
use crate::linear::{forecast_periods, Z_95};
use crate::task::InlineExecutor;
use crate::tuning::tuner_for;
use revenue_api::HoltOptions;
use revenue_spi::{
    ForecastPoint, HoltFitState, HoltForecast, HoltParams, MonthlySeriesPoint, Outcome,
    TaskExecutor, YearMonth,
};

// ============================================================================
// Recurrence
// ============================================================================

/// Level and trend of the recurrence at some point in the series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoltState {
    pub level: f64,
    pub trend: f64,
}

impl HoltState {
    /// Initial state; trend is 0 for a single value. `None` when empty.
    pub fn init(values: &[f64]) -> Option<Self> {
        let &first = values.first()?;
        let trend = values.get(1).map_or(0.0, |second| second - first);
        Some(Self {
            level: first,
            trend,
        })
    }

    /// Forecast for the next observation.
    pub fn one_step(&self) -> f64 {
        self.level + self.trend
    }

    pub fn update(&mut self, y: f64, alpha: f64, beta: f64) {
        let previous = self.level;
        self.level = alpha * y + (1.0 - alpha) * (self.level + self.trend);
        self.trend = beta * (self.level - previous) + (1.0 - beta) * self.trend;
    }

    /// Forecast `h` steps past this state.
    pub fn project(&self, h: usize) -> f64 {
        self.level + h as f64 * self.trend
    }

    /// Terminal state after running the recurrence over all of `values`.
    pub fn replay(values: &[f64], params: HoltParams) -> Option<Self> {
        let mut state = Self::init(values)?;
        for &y in &values[1..] {
            state.update(y, params.alpha, params.beta);
        }
        Some(state)
    }
}

/// In-sample fit: terminal state plus one-step residuals.
#[derive(Debug, Clone, PartialEq)]
pub struct HoltFit {
    pub state: HoltFitState,
    pub residuals: Vec<f64>,
}

/// Run the recurrence with fixed parameters, collecting residuals.
///
/// `residual_std` is the uncentered sample deviation `sqrt(Σr² / (m - 1))`
/// over the `m` one-step residuals: residuals are not mean-adjusted, so a
/// biased fit widens the band. It is 0 when `m <= 1`.
pub fn fit(values: &[f64], params: HoltParams) -> Option<HoltFit> {
    let mut state = HoltState::init(values)?;
    let mut residuals = Vec::with_capacity(values.len().saturating_sub(1));
    for &y in &values[1..] {
        residuals.push(y - state.one_step());
        state.update(y, params.alpha, params.beta);
    }

    let m = residuals.len();
    let residual_std = if m > 1 {
        (residuals.iter().map(|r| r * r).sum::<f64>() / (m - 1) as f64).sqrt()
    } else {
        0.0
    };

    Some(HoltFit {
        state: HoltFitState {
            level: state.level,
            trend: state.trend,
            residual_std,
            alpha: params.alpha,
            beta: params.beta,
        },
        residuals,
    })
}

/// Forecast points with the analytic band.
pub fn analytic_forecast(state: &HoltFitState, last: YearMonth, horizon: usize) -> Vec<ForecastPoint> {
    let terminal = HoltState {
        level: state.level,
        trend: state.trend,
    };
    let margin = Z_95 * state.residual_std;
    forecast_periods(last, horizon)
        .into_iter()
        .enumerate()
        .map(|(k, period)| {
            let predicted = terminal.project(k + 1);
            ForecastPoint::bounded(period, predicted, predicted - margin, predicted + margin)
        })
        .collect()
}

// ============================================================================
// Forecaster
// ============================================================================

/// Holt forecaster. Parameters marked `auto` are tuned first; bootstrap
/// runs inline or, when asked for asynchronously, on the executor.
#[derive(Debug, Clone, Default)]
pub struct HoltForecaster<E = InlineExecutor> {
    executor: E,
}

impl HoltForecaster<InlineExecutor> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: TaskExecutor> HoltForecaster<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Smoothing parameters for `values`: the fixed ones when both are
    /// given, otherwise the configured tuner's choice.
    pub fn resolve_params(&self, values: &[f64], options: &HoltOptions) -> HoltParams {
        if let Some((alpha, beta)) = options.fixed_params() {
            return HoltParams::new(alpha, beta);
        }

        let start = HoltParams::new(
            options.alpha.resolve().unwrap_or(HoltParams::default().alpha),
            options.beta.resolve().unwrap_or(HoltParams::default().beta),
        );
        let tuner = tuner_for(options.tuner, start);
        let tuned = tuner.tune(values);
        tracing::debug!(
            tuner = tuner.name(),
            alpha = tuned.alpha,
            beta = tuned.beta,
            mse = tuned.score,
            "smoothing parameters tuned"
        );
        tuned.params()
    }

    /// Forecast `horizon` months past the end of `series`.
    ///
    /// Returns `None` for an empty series. With `bootstrap` and
    /// `bootstrap_async` both set the result is a pending computation.
    pub fn forecast(
        &self,
        series: &[MonthlySeriesPoint],
        horizon: usize,
        options: &HoltOptions,
    ) -> Option<Outcome<HoltForecast>> {
        let last = series.last()?.period;
        let values: Vec<f64> = series.iter().map(|p| p.total).collect();

        let params = self.resolve_params(&values, options);
        let HoltFit { state, residuals } = fit(&values, params)?;
        let mut forecast = analytic_forecast(&state, last, horizon);
        let returned_residuals = options.return_residuals.then(|| residuals.clone());

        if !options.bootstrap {
            return Some(Outcome::Ready(HoltForecast {
                state,
                forecast,
                bootstrap_samples: None,
                residuals: returned_residuals,
            }));
        }

        let engine = BootstrapEngine::new(options.samples()).with_seed(options.seed);
        let samples = engine.samples();
        let steps = forecast.len();

        if options.bootstrap_async {
            let computation = engine
                .spawn(&self.executor, values, steps, params, residuals, None)
                .map(move |bands| {
                    apply_bands(&mut forecast, &bands);
                    HoltForecast {
                        state,
                        forecast,
                        bootstrap_samples: Some(samples),
                        residuals: returned_residuals,
                    }
                });
            return Some(Outcome::Pending(computation));
        }

        let bands = engine.bands(&values, steps, params, &residuals);
        apply_bands(&mut forecast, &bands);
        Some(Outcome::Ready(HoltForecast {
            state,
            forecast,
            bootstrap_samples: Some(samples),
            residuals: returned_residuals,
        }))
    }
}
