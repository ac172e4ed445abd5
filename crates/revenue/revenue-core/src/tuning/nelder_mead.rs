//! Nelder-Mead simplex tuner.

use super::objective::one_step_mse;
use revenue_spi::{
    clamp_param, CancelFlag, HoltParams, ParameterTuner, Progress, ProgressObserver, Result,
    TuningResult,
};

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;
const INITIAL_OFFSET: f64 = 0.05;

#[derive(Debug, Clone, Copy)]
struct Vertex {
    x: [f64; 2],
    f: f64,
}

/// Nelder-Mead search on the 2-D `(alpha, beta)` plane.
///
/// Every evaluated point is clamped into `[0.01, 0.99]` first. Stops when
/// the population standard deviation of the three vertex scores drops below
/// the tolerance, or after `max_iter` iterations.
#[derive(Debug, Clone)]
pub struct NelderMeadTuner {
    start: HoltParams,
    max_iter: usize,
    tol: f64,
}

impl Default for NelderMeadTuner {
    fn default() -> Self {
        Self {
            start: HoltParams::default(),
            max_iter: 200,
            tol: 1e-6,
        }
    }
}

impl NelderMeadTuner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, start: HoltParams) -> Self {
        self.start = start;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}

fn along(from: [f64; 2], to: [f64; 2], coefficient: f64) -> [f64; 2] {
    [
        from[0] + coefficient * (to[0] - from[0]),
        from[1] + coefficient * (to[1] - from[1]),
    ]
}

fn spread(simplex: &[Vertex; 3]) -> f64 {
    let mean = simplex.iter().map(|v| v.f).sum::<f64>() / 3.0;
    let sq: f64 = simplex.iter().map(|v| (v.f - mean).powi(2)).sum();
    (sq / 3.0).sqrt()
}

impl ParameterTuner for NelderMeadTuner {
    fn tune_cancelable(
        &self,
        series: &[f64],
        observer: Option<&dyn ProgressObserver>,
        cancel: &CancelFlag,
    ) -> Result<TuningResult> {
        if series.len() < 3 {
            return Ok(TuningResult::fallback());
        }

        let eval = |x: [f64; 2]| Vertex {
            x,
            f: one_step_mse(series, clamp_param(x[0]), clamp_param(x[1])),
        };

        let [a0, b0] = [self.start.alpha, self.start.beta];
        let mut simplex = [
            eval([a0, b0]),
            eval([(a0 + INITIAL_OFFSET).min(0.99), b0]),
            eval([a0, (b0 + INITIAL_OFFSET).min(0.99)]),
        ];

        let interval = Progress::interval(self.max_iter);
        let mut iterations = 0;
        for iter in 0..self.max_iter {
            cancel.check()?;
            iterations = iter + 1;

            simplex.sort_by(|a, b| a.f.total_cmp(&b.f));
            let [best, second, worst] = simplex;
            let centroid = along(best.x, second.x, 0.5);

            let reflected = eval(along(centroid, worst.x, -REFLECT));
            if reflected.f < best.f {
                let expanded = eval(along(centroid, worst.x, -EXPAND));
                simplex[2] = if expanded.f < reflected.f {
                    expanded
                } else {
                    reflected
                };
            } else if reflected.f < second.f {
                simplex[2] = reflected;
            } else {
                let contracted = eval(along(centroid, worst.x, CONTRACT));
                if contracted.f < worst.f {
                    simplex[2] = contracted;
                } else {
                    simplex[1] = eval(along(best.x, second.x, SHRINK));
                    simplex[2] = eval(along(best.x, worst.x, SHRINK));
                }
            }

            if let Some(observer) = observer {
                if iterations % interval == 0 {
                    let lead = simplex.iter().min_by(|a, b| a.f.total_cmp(&b.f));
                    if let Some(lead) = lead {
                        let current = TuningResult {
                            alpha: clamp_param(lead.x[0]),
                            beta: clamp_param(lead.x[1]),
                            score: lead.f,
                        };
                        observer.on_progress(
                            &Progress::new(iterations, self.max_iter).with_best(current),
                        );
                    }
                }
            }

            if spread(&simplex) < self.tol {
                break;
            }
        }

        let best = simplex
            .iter()
            .copied()
            .min_by(|a, b| a.f.total_cmp(&b.f))
            .unwrap_or(simplex[0]);

        tracing::debug!(iterations, mse = best.f, "nelder-mead finished");
        Ok(TuningResult {
            alpha: clamp_param(best.x[0]),
            beta: clamp_param(best.x[1]),
            score: best.f,
        })
    }

    fn name(&self) -> &'static str {
        "nelder-mead"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seasonal_bumps() -> Vec<f64> {
        (0..18)
            .map(|i| 200.0 + 8.0 * i as f64 + if i % 3 == 0 { 12.0 } else { -4.0 })
            .collect()
    }

    #[test]
    fn test_needs_three_points() {
        let tuner = NelderMeadTuner::new();
        assert_eq!(tuner.tune(&[1.0, 2.0]), TuningResult::fallback());
    }

    #[test]
    fn test_improves_on_start() {
        let values = seasonal_bumps();
        let result = NelderMeadTuner::new().tune(&values);
        assert!(result.score <= one_step_mse(&values, 0.5, 0.2));
    }

    #[test]
    fn test_score_matches_returned_params() {
        let values = seasonal_bumps();
        let result = NelderMeadTuner::new().tune(&values);
        assert_relative_eq!(
            result.score,
            one_step_mse(&values, result.alpha, result.beta),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_deterministic() {
        let values = seasonal_bumps();
        let tuner = NelderMeadTuner::new();
        assert_eq!(tuner.tune(&values), tuner.tune(&values));
    }

    #[test]
    fn test_iteration_cap_respected() {
        let values = seasonal_bumps();
        let result = NelderMeadTuner::new()
            .with_max_iter(1)
            .tune(&values);
        assert!(result.score <= one_step_mse(&values, 0.5, 0.2));
    }
}
