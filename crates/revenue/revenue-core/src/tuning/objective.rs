//! One-step-ahead error objective shared by every tuner.

use crate::holt::HoltState;

/// Mean squared one-step-ahead error of Holt's recurrence over `values`.
///
/// Infinite when there is nothing to predict (fewer than two values).
pub fn one_step_mse(values: &[f64], alpha: f64, beta: f64) -> f64 {
    let Some(mut state) = HoltState::init(values) else {
        return f64::INFINITY;
    };

    let mut sse = 0.0;
    for &y in &values[1..] {
        let err = y - state.one_step();
        sse += err * err;
        state.update(y, alpha, beta);
    }

    let count = values.len() - 1;
    if count == 0 {
        f64::INFINITY
    } else {
        sse / count as f64
    }
}
