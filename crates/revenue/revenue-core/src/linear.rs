//! Ordinary least squares trend forecaster
//!
//! Fits `y = intercept + slope * t` against the index positions `0..n-1`
//! of the series rather than calendar time, so gaps between months do not
//! affect conditioning. The band is `predicted ± 1.96 * residual_std`.

use revenue_spi::{ForecastPoint, LinearForecast, MonthlySeriesPoint, YearMonth};

/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.96;

/// The `horizon` calendar months following `last`.
pub fn forecast_periods(last: YearMonth, horizon: usize) -> Vec<YearMonth> {
    (1..=horizon)
        .map_while(|step| u32::try_from(step).ok().and_then(|s| last.plus_months(s)))
        .collect()
}

/// Slope and intercept of the OLS fit over index positions.
pub fn ols_fit(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let x_mean = (values.len().saturating_sub(1)) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    let slope = if den == 0.0 { 0.0 } else { num / den };
    (slope, y_mean - slope * x_mean)
}

/// Linear trend forecast over a monthly series.
///
/// Returns `None` for an empty series.
pub fn linear_forecast(series: &[MonthlySeriesPoint], horizon: usize) -> Option<LinearForecast> {
    let last = series.last()?.period;
    let values: Vec<f64> = series.iter().map(|p| p.total).collect();
    let n = values.len();

    let (slope, intercept) = ols_fit(&values);
    let rss: f64 = values
        .iter()
        .enumerate()
        .map(|(i, &y)| (y - (intercept + slope * i as f64)).powi(2))
        .sum();
    let residual_std = if n > 1 {
        (rss / (n - 1) as f64).sqrt()
    } else {
        0.0
    };

    let forecast = forecast_periods(last, horizon)
        .into_iter()
        .enumerate()
        .map(|(k, period)| {
            let t = (n + k) as f64;
            let predicted = intercept + slope * t;
            ForecastPoint::bounded(
                period,
                predicted,
                predicted - Z_95 * residual_std,
                predicted + Z_95 * residual_std,
            )
        })
        .collect();

    tracing::debug!(n, slope, intercept, residual_std, "linear fit");

    Some(LinearForecast {
        slope,
        intercept,
        residual_std,
        forecast,
    })
}
