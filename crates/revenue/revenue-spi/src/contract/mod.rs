//! Contract module containing trait definitions for forecast operations

mod date_probe;
mod parameter_tuner;
mod progress_observer;
mod task_executor;

pub use date_probe::DateProbe;
pub use parameter_tuner::ParameterTuner;
pub use progress_observer::ProgressObserver;
pub use task_executor::TaskExecutor;
