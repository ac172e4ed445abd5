//! End-to-end tests for the revenue forecasting stack
//!
//! Runs complete record-to-forecast workflows through the orchestrator.

use revenue_facade::{
    ForecastConfig, ForecastConfigBuilder, ForecastInput, ForecastOrchestrator, ForecastResult,
    ForecastTable, InlineExecutor, LatestRequest, MonthlySeriesPoint, RawRecord, RequestKey,
    TunerStrategy, YearMonth,
};
use serde_json::json;

fn subscription_records() -> Vec<RawRecord> {
    let mut rows = Vec::new();
    for month in 1..=9u32 {
        for customer in 0..(3 + month) {
            rows.push(json!({
                "name": format!("cust-{}", customer),
                "MRR": 100 + 10 * customer + 5 * month,
                "createdAt": format!("2024-{:02}-{:02}", month, 1 + customer % 27),
            }));
        }
    }
    serde_json::from_value(serde_json::Value::Array(rows)).unwrap()
}

fn synthetic_series(totals: &[f64]) -> Vec<MonthlySeriesPoint> {
    let first = YearMonth::new(2022, 7).unwrap();
    totals
        .iter()
        .enumerate()
        .map(|(i, &t)| MonthlySeriesPoint::total_only(first.plus_months(i as u32).unwrap(), t))
        .collect()
}

#[test]
fn e2e_linear_from_records() {
    let orchestrator = ForecastOrchestrator::with_executor(InlineExecutor);
    let config = ForecastConfigBuilder::new().linear().horizon(6).build();

    let output = orchestrator
        .compute_forecast(subscription_records(), &config)
        .into_ready()
        .unwrap();

    assert_eq!(output.monthly_series.len(), 9);
    let result = output.forecast_result.unwrap();
    let ForecastResult::Linear(linear) = &result else {
        panic!("expected linear result");
    };
    assert!(linear.slope > 0.0);
    assert_eq!(result.forecast()[0].period.to_string(), "2024-10");
}

#[test]
fn e2e_holt_bands_are_non_negative() {
    let orchestrator = ForecastOrchestrator::with_executor(InlineExecutor);
    let shapes: [&[f64]; 4] = [
        &[900.0, 700.0, 520.0, 300.0, 180.0, 90.0, 20.0],
        &[10.0, 0.0, 30.0, 0.0, 50.0, 0.0],
        &[0.0, 0.0, 0.0],
        &[5.0],
    ];

    for totals in shapes {
        for config in [
            ForecastConfigBuilder::new().holt().horizon(18).build(),
            ForecastConfigBuilder::new()
                .holt()
                .horizon(18)
                .auto_tune(TunerStrategy::Advanced)
                .bootstrap(150)
                .seed(9)
                .build(),
        ] {
            let output = orchestrator
                .compute(ForecastInput::series(synthetic_series(totals)), &config)
                .into_ready()
                .unwrap();
            let result = output.forecast_result.unwrap();
            for point in result.forecast() {
                assert!(point.predicted >= 0.0 && point.lower >= 0.0 && point.upper >= 0.0);
                assert!(
                    point.lower <= point.predicted && point.predicted <= point.upper,
                    "band {:?} does not contain prediction",
                    point
                );
            }
        }
    }
}

#[test]
fn e2e_json_config_and_series_input() {
    let config: ForecastConfig = serde_json::from_value(json!({
        "method": "holt",
        "horizon": 3,
        "holtOptions": {"alpha": 0.7, "beta": "0.1", "returnResiduals": true}
    }))
    .unwrap();
    let records: Vec<RawRecord> = serde_json::from_value(json!([
        {"period": "2024-01", "total": 100},
        {"period": "2024-02", "total": 130},
        {"period": "2024-03", "total": 150}
    ]))
    .unwrap();

    let output = ForecastOrchestrator::with_executor(InlineExecutor)
        .compute_forecast(records, &config)
        .into_ready()
        .unwrap();

    let Some(ForecastResult::Holt(holt)) = &output.forecast_result else {
        panic!("expected holt result");
    };
    assert_eq!(holt.state.alpha, 0.7);
    assert_eq!(holt.state.beta, 0.1);
    assert_eq!(holt.residuals.as_ref().map(Vec::len), Some(2));

    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["forecast_result"]["method"], "holt");
    assert_eq!(json["monthly_series"][2]["period"], "2024-03");
}

#[test]
fn e2e_out_of_range_config_is_clamped() {
    let config: ForecastConfig = serde_json::from_value(json!({
        "method": "holt",
        "horizon": 0,
        "holt": {"alpha": 3.0, "beta": -1.0}
    }))
    .unwrap();

    let output = ForecastOrchestrator::with_executor(InlineExecutor)
        .compute(ForecastInput::series(synthetic_series(&[10.0, 20.0, 30.0])), &config)
        .into_ready()
        .unwrap();
    let Some(ForecastResult::Holt(holt)) = output.forecast_result else {
        panic!("expected holt result");
    };
    assert_eq!(holt.state.alpha, 0.99);
    assert_eq!(holt.state.beta, 0.01);
    assert_eq!(holt.forecast.len(), 1);
}

#[test]
fn e2e_negative_counts_are_clamped() {
    let config: ForecastConfig = serde_json::from_value(json!({
        "method": "holt",
        "horizon": -3,
        "holtOptions": {
            "alpha": 0.5,
            "beta": 0.2,
            "bootstrap": true,
            "bootstrapSamples": "-5",
            "seed": 4
        }
    }))
    .unwrap();
    assert_eq!(config.horizon, 1);
    assert_eq!(config.holt.bootstrap_samples, 1);

    let output = ForecastOrchestrator::with_executor(InlineExecutor)
        .compute(ForecastInput::series(synthetic_series(&[10.0, 20.0, 30.0, 35.0])), &config)
        .into_ready()
        .unwrap();
    let Some(ForecastResult::Holt(holt)) = output.forecast_result else {
        panic!("expected holt result");
    };
    assert_eq!(holt.forecast.len(), 1);
    assert_eq!(holt.bootstrap_samples, Some(1));
}

#[test]
fn e2e_table_export() {
    let output = ForecastOrchestrator::with_executor(InlineExecutor)
        .compute_forecast(
            subscription_records(),
            &ForecastConfigBuilder::new().horizon(2).build(),
        )
        .into_ready()
        .unwrap();

    let table = ForecastTable::from_output(&output);
    assert_eq!(table.len(), 11);
    let csv = table.to_csv().unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 12);
    assert!(lines[1].starts_with("2024-01,"));
    assert!(lines[11].starts_with("2024-11,,"));
}

#[test]
fn e2e_request_keys_track_latest() {
    let tracker = LatestRequest::new();
    let orchestrator = ForecastOrchestrator::with_executor(InlineExecutor);
    let input = ForecastInput::detect(subscription_records());

    let first_config = ForecastConfigBuilder::new().horizon(6).build();
    let first_key = RequestKey::new(&input, &first_config);
    let (first_generation, _) =
        tracker.track(first_key, orchestrator.compute(input.clone(), &first_config));

    assert!(tracker.is_duplicate(RequestKey::new(&input, &first_config)));

    let second_config = ForecastConfigBuilder::new().horizon(9).build();
    let second_key = RequestKey::new(&input, &second_config);
    assert_ne!(first_key, second_key);
    let (second_generation, outcome) =
        tracker.track(second_key, orchestrator.compute(input, &second_config));

    assert!(!tracker.is_current(first_generation));
    assert!(tracker.is_current(second_generation));
    let output = outcome.into_ready().unwrap();
    assert_eq!(output.forecast_result.unwrap().forecast().len(), 9);
}
