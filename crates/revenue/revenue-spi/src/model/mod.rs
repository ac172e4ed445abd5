//! Model module containing data structures

mod computation;
mod forecast;
mod period;
mod progress;
mod record;
mod series;
mod tuning;

pub use computation::{CancelFlag, CancelHandle, CancelableComputation, Outcome};
pub use forecast::{
    BootstrapBand, ForecastOutput, ForecastPoint, ForecastResult, HoltFitState, HoltForecast,
    LinearForecast,
};
pub use period::YearMonth;
pub use progress::Progress;
pub use record::RawRecord;
pub use series::MonthlySeriesPoint;
pub use tuning::{clamp_param, HoltParams, TuningResult, PARAM_MAX, PARAM_MIN};
