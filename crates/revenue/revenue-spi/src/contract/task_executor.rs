//! Trait for running jobs as cancelable units of work

use crate::error::Result;
use crate::model::{CancelFlag, CancelableComputation};

/// Runs a job and hands back a [`CancelableComputation`] for its result.
///
/// The job receives the computation's [`CancelFlag`] and is expected to
/// check it at its own checkpoints. An executor may run the job inline and
/// return an already-resolved computation.
pub trait TaskExecutor: Send + Sync {
    fn submit<T, F>(&self, job: F) -> CancelableComputation<T>
    where
        T: Send + 'static,
        F: FnOnce(&CancelFlag) -> Result<T> + Send + 'static;
}
