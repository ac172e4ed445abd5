//! Integration tests for the revenue forecasting stack

use approx::assert_relative_eq;
use revenue_facade::{
    linear_forecast, one_step_mse, CoordinateDescentTuner, GridSearchTuner, MonthlySeriesPoint,
    NelderMeadTuner, ParameterTuner, RawRecord, SeriesAggregator, YearMonth,
};
use serde_json::json;

fn records_from_json(value: serde_json::Value) -> Vec<RawRecord> {
    serde_json::from_value(value).unwrap()
}

fn sample_records() -> Vec<RawRecord> {
    records_from_json(json!([
        {"id": "a", "MRR": 100, "date": "2024-01-05"},
        {"id": "b", "MRR": 200, "date": "2024-01-15"},
        {"id": "a", "MRR": 120, "date": "2024-02-01"},
        {"id": "c", "MRR": 50, "date": "2024-02-10"}
    ]))
}

fn monthly(start: &str, totals: &[f64]) -> Vec<MonthlySeriesPoint> {
    let first: YearMonth = start.parse().unwrap();
    totals
        .iter()
        .enumerate()
        .map(|(i, &t)| MonthlySeriesPoint::total_only(first.plus_months(i as u32).unwrap(), t))
        .collect()
}

#[test]
fn test_aggregation_decomposition() {
    let series = SeriesAggregator::new().aggregate(&sample_records()).unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].period.to_string(), "2024-01");
    assert_eq!(series[0].total, 300.0);
    assert_eq!(series[0].new, 300.0);
    assert_eq!(series[0].expansion, 0.0);
    assert_eq!(series[0].churn, 0.0);

    assert_eq!(series[1].period.to_string(), "2024-02");
    assert_eq!(series[1].total, 170.0);
    assert_eq!(series[1].new, 50.0);
    assert_eq!(series[1].expansion, 20.0);
    assert_eq!(series[1].churn, 200.0);
}

#[test]
fn test_aggregation_no_data() {
    let aggregator = SeriesAggregator::new();
    assert!(aggregator.aggregate(&[]).is_none());

    let dateless = records_from_json(json!([
        {"id": "a", "MRR": 100, "plan": "pro"},
        {"id": "b", "MRR": "n/a", "plan": "basic"}
    ]));
    assert!(aggregator.aggregate(&dateless).is_none());
}

#[test]
fn test_aggregation_is_deterministic_and_order_independent() {
    let aggregator = SeriesAggregator::new();
    let records = sample_records();
    let first = aggregator.aggregate(&records).unwrap();
    let second = aggregator.aggregate(&records).unwrap();
    assert_eq!(first, second);

    let mut shuffled = records.clone();
    shuffled.rotate_left(3);
    shuffled.swap(0, 1);
    assert_eq!(aggregator.aggregate(&shuffled).unwrap(), first);
}

#[test]
fn test_aggregation_gaps_are_not_filled() {
    let records = records_from_json(json!([
        {"name": "acme", "MRR": 10, "signupDate": "2024-01-10"},
        {"name": "acme", "MRR": 10, "signupDate": "2024-04-10"}
    ]));
    let series = SeriesAggregator::new().aggregate(&records).unwrap();
    let periods: Vec<String> = series.iter().map(|p| p.period.to_string()).collect();
    assert_eq!(periods, vec!["2024-01", "2024-04"]);
    assert_eq!(series[1].new, 0.0);
    assert_eq!(series[1].churn, 0.0);
}

#[test]
fn test_linear_forecast_shape() {
    let result = linear_forecast(&monthly("2024-10", &[100.0, 120.0, 140.0]), 12).unwrap();

    assert_relative_eq!(result.slope, 20.0, epsilon = 1e-9);
    assert_eq!(result.forecast.len(), 12);
    assert_eq!(result.forecast[0].period.to_string(), "2025-01");
    assert_eq!(result.forecast[11].period.to_string(), "2025-12");
}

#[test]
fn test_tuner_convergence_on_noiseless_trend() {
    let values: Vec<f64> = (0..24).map(|i| 1_000.0 + 35.0 * i as f64).collect();
    let baseline = one_step_mse(&values, 0.5, 0.2);

    let fast = CoordinateDescentTuner::new().tune(&values);
    let advanced = NelderMeadTuner::new().tune(&values);
    let grid = GridSearchTuner::new().tune(&values);

    assert!(fast.score <= baseline, "fast: {} > {}", fast.score, baseline);
    assert!(advanced.score <= baseline, "advanced: {} > {}", advanced.score, baseline);
    assert!(grid.score <= baseline + 1e-9, "grid: {} > {}", grid.score, baseline);
}

#[test]
fn test_tuner_convergence_on_noisy_trend() {
    let noise = [4.0, -7.0, 2.0, 9.0, -3.0, -8.0, 5.0, 1.0, -2.0, 6.0, -5.0, 3.0];
    let values: Vec<f64> = noise
        .iter()
        .enumerate()
        .map(|(i, n)| 500.0 + 12.0 * i as f64 + n)
        .collect();
    let baseline = one_step_mse(&values, 0.5, 0.2);

    for tuner in [
        Box::new(CoordinateDescentTuner::new()) as Box<dyn ParameterTuner>,
        Box::new(NelderMeadTuner::new()),
    ] {
        let result = tuner.tune(&values);
        assert!(result.score <= baseline, "{} did not improve", tuner.name());
        assert_relative_eq!(
            result.score,
            one_step_mse(&values, result.alpha, result.beta),
            epsilon = 1e-9
        );
    }
}
