//! Task executors for cancelable background work.

mod executor;

pub use executor::{BlockingExecutor, InlineExecutor};
