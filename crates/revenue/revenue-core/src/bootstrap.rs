//! Residual bootstrap confidence bands
//!
//! Each trial replays the Holt recurrence to its terminal `(level, trend)`,
//! then for every forecast step `h` draws one in-sample residual uniformly
//! with replacement and records `max(0, level + h·trend + r)`. The band for
//! a step is the nearest-rank 2.5th / 97.5th percentile of its draws.

use crate::holt::HoltState;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use revenue_api::DEFAULT_BOOTSTRAP_SAMPLES;
use revenue_spi::{
    BootstrapBand, CancelFlag, CancelableComputation, ForecastPoint, HoltParams, Progress,
    ProgressObserver, Result, TaskExecutor,
};
use std::sync::Arc;

const LOWER_QUANTILE: f64 = 0.025;
const UPPER_QUANTILE: f64 = 0.975;

/// Residual-resampling band generator.
#[derive(Debug, Clone)]
pub struct BootstrapEngine {
    samples: usize,
    seed: Option<u64>,
}

impl Default for BootstrapEngine {
    fn default() -> Self {
        Self::new(DEFAULT_BOOTSTRAP_SAMPLES)
    }
}

impl BootstrapEngine {
    /// Engine running `samples` trials (at least one).
    pub fn new(samples: usize) -> Self {
        Self {
            samples: samples.max(1),
            seed: None,
        }
    }

    /// Fix the random source; `None` draws from entropy.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Bands for `horizon` steps, computed on the calling thread.
    pub fn bands(
        &self,
        series: &[f64],
        horizon: usize,
        params: HoltParams,
        residuals: &[f64],
    ) -> Vec<BootstrapBand> {
        self.bands_cancelable(series, horizon, params, residuals, None, &CancelFlag::new())
            .unwrap_or_default()
    }

    /// Bands for `horizon` steps, reporting progress roughly every 5% of
    /// trials and stopping with `Err(Cancelled)` once `cancel` is raised.
    pub fn bands_cancelable(
        &self,
        series: &[f64],
        horizon: usize,
        params: HoltParams,
        residuals: &[f64],
        observer: Option<&dyn ProgressObserver>,
        cancel: &CancelFlag,
    ) -> Result<Vec<BootstrapBand>> {
        let Some(terminal) = HoltState::replay(series, params) else {
            return Ok(Vec::new());
        };
        if horizon == 0 {
            return Ok(Vec::new());
        }

        let mut rng = self.rng();
        let mut draws = vec![Vec::with_capacity(self.samples); horizon];
        let interval = Progress::interval(self.samples);

        for trial in 0..self.samples {
            cancel.check()?;
            for (step, column) in draws.iter_mut().enumerate() {
                let noise = residuals.choose(&mut rng).copied().unwrap_or(0.0);
                column.push((terminal.project(step + 1) + noise).max(0.0));
            }

            let completed = trial + 1;
            if let Some(observer) = observer {
                if completed % interval == 0 {
                    observer.on_progress(&Progress::new(completed, self.samples));
                }
            }
        }
        cancel.check()?;

        tracing::debug!(
            trials = self.samples,
            horizon,
            pool = residuals.len(),
            "bootstrap bands computed"
        );
        Ok(draws.iter_mut().map(|column| percentile_band(column)).collect())
    }

    /// Run the bootstrap as a cancelable computation on `executor`.
    ///
    /// The job owns its copies of the series and residual pool. Progress is
    /// reported to `observer` from whichever thread runs the trials.
    pub fn spawn<E: TaskExecutor>(
        &self,
        executor: &E,
        series: Vec<f64>,
        horizon: usize,
        params: HoltParams,
        residuals: Vec<f64>,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> CancelableComputation<Vec<BootstrapBand>> {
        let engine = self.clone();
        executor.submit(move |cancel| {
            engine.bands_cancelable(
                &series,
                horizon,
                params,
                &residuals,
                observer.as_deref(),
                cancel,
            )
        })
    }
}

/// Nearest-rank 2.5th / 97.5th percentiles; falls back to the extremes at
/// the array bounds.
pub fn percentile_band(draws: &mut [f64]) -> BootstrapBand {
    draws.sort_by(f64::total_cmp);
    let pick = |quantile: f64| {
        let index = (quantile * draws.len() as f64).floor() as usize;
        draws.get(index).or(draws.last()).copied().unwrap_or(0.0)
    };
    BootstrapBand {
        lower: pick(LOWER_QUANTILE),
        upper: pick(UPPER_QUANTILE),
    }
}

/// Replace each point's band with its bootstrap band, keeping the point
/// forecast.
pub fn apply_bands(forecast: &mut [ForecastPoint], bands: &[BootstrapBand]) {
    for (point, band) in forecast.iter_mut().zip(bands) {
        *point = ForecastPoint::bounded(point.period, point.predicted, band.lower, band.upper);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use revenue_spi::{ForecastError, YearMonth};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SERIES: [f64; 6] = [100.0, 110.0, 125.0, 130.0, 150.0, 155.0];
    const RESIDUALS: [f64; 5] = [-6.0, 3.0, -2.0, 8.0, -4.0];

    fn params() -> HoltParams {
        HoltParams::new(0.5, 0.3)
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let mut draws: Vec<f64> = (0..200).rev().map(|i| i as f64).collect();
        let band = percentile_band(&mut draws);
        assert_eq!(band.lower, 5.0);
        assert_eq!(band.upper, 195.0);
    }

    #[test]
    fn test_percentile_small_arrays() {
        let band = percentile_band(&mut [7.0]);
        assert_eq!((band.lower, band.upper), (7.0, 7.0));
        let band = percentile_band(&mut []);
        assert_eq!((band.lower, band.upper), (0.0, 0.0));
    }

    #[test]
    fn test_empty_pool_collapses_to_point_forecast() {
        let bands = BootstrapEngine::new(50).bands(&SERIES, 3, params(), &[]);
        let terminal = HoltState::replay(&SERIES, params()).unwrap();
        for (h, band) in bands.iter().enumerate() {
            assert_relative_eq!(band.lower, terminal.project(h + 1), epsilon = 1e-9);
            assert_relative_eq!(band.upper, terminal.project(h + 1), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_bands_bracket_residual_range() {
        let bands = BootstrapEngine::new(400)
            .with_seed(Some(5))
            .bands(&SERIES, 4, params(), &RESIDUALS);
        let terminal = HoltState::replay(&SERIES, params()).unwrap();
        assert_eq!(bands.len(), 4);
        for (h, band) in bands.iter().enumerate() {
            let center = terminal.project(h + 1);
            assert!(band.lower >= center - 6.0 - 1e-9);
            assert!(band.upper <= center + 8.0 + 1e-9);
            assert!(band.lower <= band.upper);
        }
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let engine = BootstrapEngine::new(100).with_seed(Some(42));
        assert_eq!(
            engine.bands(&SERIES, 6, params(), &RESIDUALS),
            engine.bands(&SERIES, 6, params(), &RESIDUALS)
        );
    }

    #[test]
    fn test_draws_clamped_at_zero() {
        let falling = [50.0, 30.0, 10.0];
        let bands = BootstrapEngine::new(20).bands(&falling, 5, params(), &[-1.0, 1.0]);
        assert!(bands.iter().all(|b| b.lower >= 0.0 && b.upper >= 0.0));
        assert_eq!(bands[4].upper, 0.0);
    }

    #[test]
    fn test_progress_and_cancel() {
        let flag = CancelFlag::new();
        let calls = AtomicUsize::new(0);
        let observer = |p: &revenue_spi::Progress| {
            calls.fetch_add(1, Ordering::SeqCst);
            if p.percent() >= 50.0 {
                flag.cancel();
            }
        };
        let result = BootstrapEngine::new(200).bands_cancelable(
            &SERIES,
            3,
            params(),
            &RESIDUALS,
            Some(&observer),
            &flag,
        );
        assert_eq!(result, Err(ForecastError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_apply_bands_keeps_prediction_inside() {
        let period = YearMonth::new(2024, 1).unwrap();
        let mut forecast = vec![ForecastPoint::bounded(period, 100.0, 90.0, 110.0)];
        apply_bands(&mut forecast, &[BootstrapBand { lower: 101.0, upper: 120.0 }]);
        assert_eq!(forecast[0].lower, 100.0);
        assert_eq!(forecast[0].upper, 120.0);
        assert_eq!(forecast[0].predicted, 100.0);
    }
}
