//! Merged actual / forecast table and CSV export.

use revenue_spi::{
    ForecastError, ForecastOutput, ForecastPoint, MonthlySeriesPoint, Result, YearMonth,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;

/// One month of the merged table. Missing values export as empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRow {
    pub period: YearMonth,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ForecastRow {
    fn empty(period: YearMonth) -> Self {
        Self {
            period,
            actual: None,
            predicted: None,
            lower: None,
            upper: None,
        }
    }
}

/// Actuals and forecast side by side, one row per period in ascending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastTable {
    rows: Vec<ForecastRow>,
}

impl ForecastTable {
    pub fn merge(series: &[MonthlySeriesPoint], forecast: &[ForecastPoint]) -> Self {
        let mut rows: BTreeMap<YearMonth, ForecastRow> = BTreeMap::new();
        for point in series {
            rows.entry(point.period)
                .or_insert_with(|| ForecastRow::empty(point.period))
                .actual = Some(point.total);
        }
        for point in forecast {
            let row = rows
                .entry(point.period)
                .or_insert_with(|| ForecastRow::empty(point.period));
            row.predicted = Some(point.predicted);
            row.lower = Some(point.lower);
            row.upper = Some(point.upper);
        }
        Self {
            rows: rows.into_values().collect(),
        }
    }

    pub fn from_output(output: &ForecastOutput) -> Self {
        let forecast = output
            .forecast_result
            .as_ref()
            .map(|result| result.forecast())
            .unwrap_or_default();
        Self::merge(&output.monthly_series, forecast)
    }

    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write `period,actual,predicted,lower,upper` rows to `writer`.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        if self.rows.is_empty() {
            csv.write_record(["period", "actual", "predicted", "lower", "upper"])
                .map_err(export_error)?;
        }
        for row in &self.rows {
            csv.serialize(row).map_err(export_error)?;
        }
        csv.flush().map_err(|e| ForecastError::Export(e.to_string()))
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ForecastError::Export(e.to_string()))
    }
}

fn export_error(err: csv::Error) -> ForecastError {
    ForecastError::Export(err.to_string())
}
