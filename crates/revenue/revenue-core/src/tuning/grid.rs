//! Exhaustive grid search tuner.

use super::objective::one_step_mse;
use rayon::prelude::*;
use revenue_spi::{
    CancelFlag, ForecastError, ParameterTuner, Progress, ProgressObserver, Result, TuningResult,
};

const DEFAULT_STEP: f64 = 0.05;

/// Evaluates every `(alpha, beta)` cell of a regular grid over `(0, 1)`.
///
/// With the default step of 0.05 both axes run 0.05..=0.95 (361 cells).
/// Sequential runs report progress roughly every 5% of cells together with
/// the best result so far; parallel runs only report completion.
#[derive(Debug, Clone)]
pub struct GridSearchTuner {
    step: f64,
    parallel: bool,
}

impl Default for GridSearchTuner {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            parallel: false,
        }
    }
}

impl GridSearchTuner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid spacing; non-positive values fall back to the default.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = if step > 0.0 && step < 1.0 {
            step
        } else {
            tracing::warn!(step, "invalid grid step, using default");
            DEFAULT_STEP
        };
        self
    }

    /// Evaluate cells on the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Values along one axis.
    pub fn axis(&self) -> Vec<f64> {
        (1..)
            .map(|k| k as f64 * self.step)
            .take_while(|v| *v < 1.0 - 1e-9)
            .collect()
    }

    fn cells(&self) -> Vec<(f64, f64)> {
        let axis = self.axis();
        axis.iter()
            .flat_map(|&a| axis.iter().map(move |&b| (a, b)))
            .collect()
    }

    fn search_sequential(
        &self,
        series: &[f64],
        cells: &[(f64, f64)],
        observer: Option<&dyn ProgressObserver>,
        cancel: &CancelFlag,
    ) -> Result<Option<TuningResult>> {
        let interval = Progress::interval(cells.len());
        let mut best: Option<TuningResult> = None;

        for (index, &(alpha, beta)) in cells.iter().enumerate() {
            cancel.check()?;
            let score = one_step_mse(series, alpha, beta);
            if best.map_or(true, |b| score < b.score) {
                best = Some(TuningResult { alpha, beta, score });
            }

            let completed = index + 1;
            if completed % interval == 0 || completed == cells.len() {
                if let (Some(observer), Some(best)) = (observer, best) {
                    observer.on_progress(&Progress::new(completed, cells.len()).with_best(best));
                }
            }
        }
        Ok(best)
    }

    fn search_parallel(
        &self,
        series: &[f64],
        cells: &[(f64, f64)],
        observer: Option<&dyn ProgressObserver>,
        cancel: &CancelFlag,
    ) -> Result<Option<TuningResult>> {
        let scores: Option<Vec<f64>> = cells
            .par_iter()
            .map(|&(alpha, beta)| {
                (!cancel.is_cancelled()).then(|| one_step_mse(series, alpha, beta))
            })
            .collect();
        let scores = scores.ok_or(ForecastError::Cancelled)?;

        // First minimum in cell order, same as the sequential scan.
        let mut best: Option<TuningResult> = None;
        for (&(alpha, beta), &score) in cells.iter().zip(&scores) {
            if best.map_or(true, |b| score < b.score) {
                best = Some(TuningResult { alpha, beta, score });
            }
        }

        if let (Some(observer), Some(best)) = (observer, best) {
            observer.on_progress(&Progress::new(cells.len(), cells.len()).with_best(best));
        }
        Ok(best)
    }
}

impl ParameterTuner for GridSearchTuner {
    fn tune_cancelable(
        &self,
        series: &[f64],
        observer: Option<&dyn ProgressObserver>,
        cancel: &CancelFlag,
    ) -> Result<TuningResult> {
        if series.len() < 2 {
            return Ok(TuningResult::fallback());
        }

        let cells = self.cells();
        let best = if self.parallel {
            self.search_parallel(series, &cells, observer, cancel)?
        } else {
            self.search_sequential(series, &cells, observer, cancel)?
        };

        let result = best.unwrap_or_else(TuningResult::fallback);
        tracing::debug!(
            cells = cells.len(),
            alpha = result.alpha,
            beta = result.beta,
            mse = result.score,
            "grid search finished"
        );
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "grid"
    }
}
