//! Coordinate descent tuner.

use super::objective::one_step_mse;
use revenue_spi::{
    clamp_param, CancelFlag, HoltParams, ParameterTuner, Progress, ProgressObserver, Result,
    TuningResult, PARAM_MAX, PARAM_MIN,
};

/// Minimum decrease in MSE that counts as an improvement.
const IMPROVEMENT: f64 = 1e-9;

/// Fast coordinate descent over `(alpha, beta)`.
///
/// For each step size in a shrinking schedule, alternately scans alpha
/// with beta held fixed and beta with alpha held fixed, in a window of
/// four steps either side of the current best. A resolution is left once a
/// sweep finds no improvement or the sweep cap is hit.
#[derive(Debug, Clone)]
pub struct CoordinateDescentTuner {
    start: HoltParams,
    steps: Vec<f64>,
    max_sweeps: usize,
}

impl Default for CoordinateDescentTuner {
    fn default() -> Self {
        Self {
            start: HoltParams::default(),
            steps: vec![0.08, 0.04, 0.02, 0.01],
            max_sweeps: 8,
        }
    }
}

impl CoordinateDescentTuner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the search from a caller-supplied guess.
    pub fn with_start(mut self, start: HoltParams) -> Self {
        self.start = start.clamped();
        self
    }

    pub fn with_steps(mut self, steps: Vec<f64>) -> Self {
        self.steps = steps.into_iter().filter(|s| *s > 0.0 && s.is_finite()).collect();
        self
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps.max(1);
        self
    }

    /// Scan one coordinate around `current`. Returns the new value and score
    /// when the scan beats `best`.
    fn scan(current: f64, step: f64, best: f64, eval: impl Fn(f64) -> f64) -> Option<(f64, f64)> {
        let lo = (current - step * 4.0).max(PARAM_MIN);
        let hi = (current + step * 4.0).min(PARAM_MAX);

        let mut local = (current, best);
        let mut k = 0usize;
        loop {
            let x = lo + k as f64 * step;
            if x > hi + 1e-12 {
                break;
            }
            let score = eval(x);
            if score < local.1 - IMPROVEMENT {
                local = (x, score);
            }
            k += 1;
        }

        (local.1 < best - IMPROVEMENT).then_some(local)
    }
}

impl ParameterTuner for CoordinateDescentTuner {
    fn tune_cancelable(
        &self,
        series: &[f64],
        observer: Option<&dyn ProgressObserver>,
        cancel: &CancelFlag,
    ) -> Result<TuningResult> {
        if series.len() < 2 {
            return Ok(TuningResult::fallback());
        }

        let HoltParams {
            mut alpha,
            mut beta,
        } = self.start.clamped();
        let mut best = one_step_mse(series, alpha, beta);

        for (index, &step) in self.steps.iter().enumerate() {
            for _ in 0..self.max_sweeps {
                cancel.check()?;
                let mut improved = false;

                if let Some((a, score)) =
                    Self::scan(alpha, step, best, |a| one_step_mse(series, a, beta))
                {
                    alpha = a;
                    best = score;
                    improved = true;
                }
                if let Some((b, score)) =
                    Self::scan(beta, step, best, |b| one_step_mse(series, alpha, b))
                {
                    beta = b;
                    best = score;
                    improved = true;
                }

                if !improved {
                    break;
                }
            }

            if let Some(observer) = observer {
                let current = TuningResult {
                    alpha,
                    beta,
                    score: best,
                };
                observer.on_progress(&Progress::new(index + 1, self.steps.len()).with_best(current));
            }
        }

        tracing::debug!(alpha, beta, mse = best, "coordinate descent finished");
        Ok(TuningResult {
            alpha: clamp_param(alpha),
            beta: clamp_param(beta),
            score: best,
        })
    }

    fn name(&self) -> &'static str {
        "coordinate-descent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn noisy_trend() -> Vec<f64> {
        [0.0, 3.0, -2.0, 4.0, -1.0, 2.0, -3.0, 1.0, 0.0, 2.0, -2.0, 3.0]
            .iter()
            .enumerate()
            .map(|(i, noise)| 100.0 + 15.0 * i as f64 + noise)
            .collect()
    }

    #[test]
    fn test_short_series_falls_back() {
        let tuner = CoordinateDescentTuner::new();
        assert_eq!(tuner.tune(&[]), TuningResult::fallback());
        assert_eq!(tuner.tune(&[42.0]), TuningResult::fallback());
    }

    #[test]
    fn test_improves_on_start() {
        let values = noisy_trend();
        let result = CoordinateDescentTuner::new().tune(&values);
        assert!(result.score <= one_step_mse(&values, 0.5, 0.2));
        assert!((PARAM_MIN..=PARAM_MAX).contains(&result.alpha));
        assert!((PARAM_MIN..=PARAM_MAX).contains(&result.beta));
    }

    #[test]
    fn test_deterministic() {
        let values = noisy_trend();
        let tuner = CoordinateDescentTuner::new();
        assert_eq!(tuner.tune(&values), tuner.tune(&values));
    }

    #[test]
    fn test_start_is_clamped() {
        let values = noisy_trend();
        let result = CoordinateDescentTuner::new()
            .with_start(HoltParams::new(5.0, -1.0))
            .tune(&values);
        assert!(result.alpha <= PARAM_MAX && result.beta >= PARAM_MIN);
        assert!(result.score <= one_step_mse(&values, PARAM_MAX, PARAM_MIN));
    }

    #[test]
    fn test_reports_progress_per_step() {
        let seen = Mutex::new(Vec::new());
        let observer = |p: &Progress| seen.lock().unwrap().push(*p);
        CoordinateDescentTuner::new()
            .tune_cancelable(&noisy_trend(), Some(&observer), &CancelFlag::new())
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[3].completed, 4);
        assert!(seen.iter().all(|p| p.best.is_some()));
    }

    #[test]
    fn test_cancelled_search() {
        let flag = CancelFlag::new();
        flag.cancel();
        let result = CoordinateDescentTuner::new().tune_cancelable(&noisy_trend(), None, &flag);
        assert_eq!(result, Err(revenue_spi::ForecastError::Cancelled));
    }
}
