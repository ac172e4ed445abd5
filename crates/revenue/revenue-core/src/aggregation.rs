//! Monthly series aggregation
//!
//! Turns loosely-typed per-entity records into an ordered monthly series
//! with a new / expansion / churn decomposition.
//!
//! ## Field detection
//!
//! The date field is the first name in the configured priority list whose
//! value probes as a date in at least one record. When none matches, the
//! first record's fields are scanned in key order for one that does. The
//! [`DateProbe`] decides what counts as a date.
//!
//! ## Movement
//!
//! For month `k > 0`, each entity is compared with its value in month
//! `k - 1` of the series (the previous month *present*, not the previous
//! calendar month):
//!
//! - absent before: value counts as `new`
//! - increased: delta counts as `expansion`
//! - decreased: delta counts as `churn`
//! - present before, absent now: prior value counts as `churn`

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use revenue_api::AggregationConfig;
use revenue_spi::{DateProbe, MonthlySeriesPoint, RawRecord, YearMonth};
use serde_json::Value;
use std::collections::BTreeMap;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

// ============================================================================
// Date probe
// ============================================================================

/// Default date probe backed by `chrono`.
///
/// Only string values are considered. The month is taken as written, so a
/// timestamp with an offset is not shifted into another time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoDateProbe;

impl ChronoDateProbe {
    fn parse(text: &str) -> Option<YearMonth> {
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
            return Some(YearMonth::from_date(timestamp.date_naive()));
        }
        for format in DATETIME_FORMATS {
            if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, format) {
                return Some(YearMonth::from_date(timestamp.date()));
            }
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Some(YearMonth::from_date(date));
            }
        }
        // Bare `YYYY-MM`
        if text.len() == 7 && text.as_bytes()[4] == b'-' {
            return text.parse().ok();
        }
        None
    }
}

impl DateProbe for ChronoDateProbe {
    fn probe(&self, value: &Value) -> Option<YearMonth> {
        match value {
            Value::String(text) => {
                let text = text.trim();
                if text.is_empty() {
                    None
                } else {
                    Self::parse(text)
                }
            }
            _ => None,
        }
    }
}

// ============================================================================
// Field coercion
// ============================================================================

/// Coerce a revenue field to a number. Non-numeric content becomes 0.
pub fn coerce_revenue(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn entity_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Aggregates raw records into a [`MonthlySeriesPoint`] series.
#[derive(Debug, Clone)]
pub struct SeriesAggregator<P = ChronoDateProbe> {
    config: AggregationConfig,
    probe: P,
}

impl SeriesAggregator<ChronoDateProbe> {
    pub fn new() -> Self {
        Self::with_config(AggregationConfig::default())
    }

    pub fn with_config(config: AggregationConfig) -> Self {
        Self {
            config,
            probe: ChronoDateProbe,
        }
    }
}

impl Default for SeriesAggregator<ChronoDateProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: DateProbe> SeriesAggregator<P> {
    /// Aggregator with a caller-supplied date probe.
    pub fn with_probe(config: AggregationConfig, probe: P) -> Self {
        Self { config, probe }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Find the field holding record dates, if any.
    pub fn detect_date_field(&self, records: &[RawRecord]) -> Option<String> {
        let probes_somewhere = |field: &str| {
            records
                .iter()
                .any(|record| record.get(field).and_then(|v| self.probe.probe(v)).is_some())
        };

        if let Some(field) = self
            .config
            .date_fields
            .iter()
            .find(|field| probes_somewhere(field))
        {
            return Some(field.clone());
        }

        let first = records.first()?;
        let fallback = first.keys().find(|field| probes_somewhere(field)).cloned();
        if let Some(field) = &fallback {
            tracing::debug!(field = %field, "date field found by scanning record fields");
        }
        fallback
    }

    /// Aggregate records into a monthly series.
    ///
    /// Returns `None` when there are no records or no field parses as a date.
    /// Within a month the last record seen for an entity wins.
    pub fn aggregate(&self, records: &[RawRecord]) -> Option<Vec<MonthlySeriesPoint>> {
        if records.is_empty() {
            return None;
        }
        let Some(date_field) = self.detect_date_field(records) else {
            tracing::debug!(records = records.len(), "no date field found, nothing to aggregate");
            return None;
        };

        let mut months: BTreeMap<YearMonth, BTreeMap<String, f64>> = BTreeMap::new();
        let mut skipped = 0usize;
        for (index, record) in records.iter().enumerate() {
            let Some(period) = record.get(&date_field).and_then(|v| self.probe.probe(v)) else {
                skipped += 1;
                continue;
            };
            let id = self
                .config
                .id_fields
                .iter()
                .find_map(|field| entity_id(record.get(field)))
                .unwrap_or_else(|| format!("#row-{}", index));
            let revenue = coerce_revenue(
                self.config
                    .revenue_fields
                    .iter()
                    .find_map(|field| record.get(field)),
            );
            months.entry(period).or_default().insert(id, revenue);
        }

        if skipped > 0 {
            tracing::warn!(skipped, field = %date_field, "records without a parseable date were skipped");
        }
        if months.is_empty() {
            return None;
        }

        let series = decompose(&months);
        tracing::debug!(months = series.len(), field = %date_field, "aggregated monthly series");
        Some(series)
    }
}

fn decompose(months: &BTreeMap<YearMonth, BTreeMap<String, f64>>) -> Vec<MonthlySeriesPoint> {
    let mut series = Vec::with_capacity(months.len());
    let mut previous: Option<&BTreeMap<String, f64>> = None;

    for (&period, entities) in months {
        let total: f64 = entities.values().sum();
        let point = match previous {
            None => MonthlySeriesPoint {
                period,
                total,
                new: total,
                expansion: 0.0,
                churn: 0.0,
            },
            Some(prior) => {
                let mut new = 0.0;
                let mut expansion = 0.0;
                let mut churn = 0.0;
                for (id, &current) in entities {
                    match prior.get(id) {
                        None => new += current,
                        Some(&before) if current > before => expansion += current - before,
                        Some(&before) if current < before => churn += before - current,
                        Some(_) => {}
                    }
                }
                churn += prior
                    .iter()
                    .filter(|(id, _)| !entities.contains_key(*id))
                    .map(|(_, &before)| before)
                    .sum::<f64>();
                MonthlySeriesPoint {
                    period,
                    total,
                    new,
                    expansion,
                    churn,
                }
            }
        };
        series.push(point);
        previous = Some(entities);
    }
    series
}
