//! Forecast orchestration
//!
//! Single entry point: turns raw records (or an already-aggregated series)
//! into a monthly series, dispatches to the configured forecaster and
//! passes through whichever shape it returns, immediate or pending.

use crate::aggregation::{coerce_revenue, ChronoDateProbe, SeriesAggregator};
use crate::holt::HoltForecaster;
use crate::linear::linear_forecast;
use crate::task::BlockingExecutor;
use revenue_api::{ForecastConfig, ForecastMethod};
use revenue_spi::{
    DateProbe, ForecastOutput, ForecastResult, MonthlySeriesPoint, Outcome, RawRecord,
    TaskExecutor, YearMonth,
};
use std::collections::BTreeMap;

// ============================================================================
// Input
// ============================================================================

/// Forecast input: raw per-entity records or a monthly series.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastInput {
    Records(Vec<RawRecord>),
    Series(Vec<MonthlySeriesPoint>),
}

impl ForecastInput {
    /// Decide by shape: when the first record has both `period` and `total`
    /// the records are read as series points.
    pub fn detect(records: Vec<RawRecord>) -> Self {
        let is_series = records
            .first()
            .is_some_and(|first| first.contains("period") && first.contains("total"));
        if is_series {
            ForecastInput::Series(series_from_records(&records))
        } else {
            ForecastInput::Records(records)
        }
    }

    /// Series input, sorted by period with the last duplicate kept.
    pub fn series(points: Vec<MonthlySeriesPoint>) -> Self {
        ForecastInput::Series(normalize_series(points))
    }

    pub fn is_series(&self) -> bool {
        matches!(self, ForecastInput::Series(_))
    }

    pub fn len(&self) -> usize {
        match self {
            ForecastInput::Records(records) => records.len(),
            ForecastInput::Series(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<RawRecord>> for ForecastInput {
    fn from(records: Vec<RawRecord>) -> Self {
        ForecastInput::detect(records)
    }
}

fn normalize_series(points: Vec<MonthlySeriesPoint>) -> Vec<MonthlySeriesPoint> {
    points
        .into_iter()
        .map(|point| (point.period, point))
        .collect::<BTreeMap<YearMonth, MonthlySeriesPoint>>()
        .into_values()
        .collect()
}

fn series_from_records(records: &[RawRecord]) -> Vec<MonthlySeriesPoint> {
    let probe = ChronoDateProbe;
    let mut dropped = 0usize;
    let points: Vec<MonthlySeriesPoint> = records
        .iter()
        .filter_map(|record| {
            let period = record.get("period").and_then(|v| probe.probe(v));
            if period.is_none() {
                dropped += 1;
            }
            Some(MonthlySeriesPoint {
                period: period?,
                total: coerce_revenue(record.get("total")),
                new: coerce_revenue(record.get("new")),
                expansion: coerce_revenue(record.get("expansion")),
                churn: coerce_revenue(record.get("churn")),
            })
        })
        .collect();

    if dropped > 0 {
        tracing::warn!(dropped, "series rows with an unparseable period were dropped");
    }
    normalize_series(points)
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Aggregates input and runs the configured forecaster.
#[derive(Debug, Clone)]
pub struct ForecastOrchestrator<E = BlockingExecutor, P = ChronoDateProbe> {
    aggregator: SeriesAggregator<P>,
    holt: HoltForecaster<E>,
}

impl ForecastOrchestrator<BlockingExecutor, ChronoDateProbe> {
    pub fn new() -> Self {
        Self::with_executor(BlockingExecutor::new())
    }
}

impl Default for ForecastOrchestrator<BlockingExecutor, ChronoDateProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TaskExecutor> ForecastOrchestrator<E, ChronoDateProbe> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            aggregator: SeriesAggregator::new(),
            holt: HoltForecaster::with_executor(executor),
        }
    }
}

impl<E: TaskExecutor, P: DateProbe> ForecastOrchestrator<E, P> {
    pub fn from_parts(aggregator: SeriesAggregator<P>, holt: HoltForecaster<E>) -> Self {
        Self { aggregator, holt }
    }

    pub fn aggregator(&self) -> &SeriesAggregator<P> {
        &self.aggregator
    }

    /// The monthly series for `input`; `None` when nothing usable remains.
    pub fn monthly_series(&self, input: &ForecastInput) -> Option<Vec<MonthlySeriesPoint>> {
        let series = match input {
            ForecastInput::Records(records) => self.aggregator.aggregate(records)?,
            ForecastInput::Series(points) => normalize_series(points.clone()),
        };
        (!series.is_empty()).then_some(series)
    }

    /// Shape-detect `records` and forecast.
    pub fn compute_forecast(
        &self,
        records: Vec<RawRecord>,
        config: &ForecastConfig,
    ) -> Outcome<ForecastOutput> {
        self.compute(ForecastInput::detect(records), config)
    }

    /// Forecast `input`. Insufficient data yields an empty output, never an
    /// error; an asynchronous bootstrap yields a pending computation.
    pub fn compute(&self, input: ForecastInput, config: &ForecastConfig) -> Outcome<ForecastOutput> {
        let Some(series) = self.monthly_series(&input) else {
            tracing::debug!(rows = input.len(), "no usable monthly series");
            return Outcome::Ready(ForecastOutput::empty());
        };
        let horizon = config.effective_horizon();
        tracing::debug!(months = series.len(), horizon, method = ?config.method, "forecasting");

        match config.method {
            ForecastMethod::Linear => {
                let result = linear_forecast(&series, horizon).map(ForecastResult::Linear);
                Outcome::Ready(ForecastOutput {
                    monthly_series: series,
                    forecast_result: result,
                })
            }
            ForecastMethod::Holt => match self.holt.forecast(&series, horizon, &config.holt) {
                Some(outcome) => outcome.map(move |holt| ForecastOutput {
                    monthly_series: series,
                    forecast_result: Some(ForecastResult::Holt(holt)),
                }),
                None => Outcome::Ready(ForecastOutput {
                    monthly_series: series,
                    forecast_result: None,
                }),
            },
        }
    }
}
