//! [`TaskExecutor`] implementations
//!
//! - [`InlineExecutor`] runs the job on the calling thread and hands back an
//!   already-resolved computation whose `cancel()` is a no-op.
//! - [`BlockingExecutor`] runs the job on the tokio blocking pool and
//!   delivers the result over a oneshot channel. Outside a tokio runtime it
//!   falls back to running inline.

use revenue_spi::{CancelFlag, CancelableComputation, ForecastError, Result, TaskExecutor};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// Runs jobs synchronously on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl TaskExecutor for InlineExecutor {
    fn submit<T, F>(&self, job: F) -> CancelableComputation<T>
    where
        T: Send + 'static,
        F: FnOnce(&CancelFlag) -> Result<T> + Send + 'static,
    {
        CancelableComputation::resolved(job(&CancelFlag::new()))
    }
}

/// Runs jobs on tokio's blocking thread pool.
#[derive(Debug, Clone, Default)]
pub struct BlockingExecutor {
    handle: Option<Handle>,
}

impl BlockingExecutor {
    /// Executor using whichever runtime is current at submit time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor bound to a specific runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    fn runtime(&self) -> Option<Handle> {
        self.handle.clone().or_else(|| Handle::try_current().ok())
    }
}

impl TaskExecutor for BlockingExecutor {
    fn submit<T, F>(&self, job: F) -> CancelableComputation<T>
    where
        T: Send + 'static,
        F: FnOnce(&CancelFlag) -> Result<T> + Send + 'static,
    {
        let Some(runtime) = self.runtime() else {
            tracing::debug!("no tokio runtime available, running job inline");
            return InlineExecutor.submit(job);
        };

        let flag = CancelFlag::new();
        let job_flag = flag.clone();
        let (tx, rx) = oneshot::channel();

        runtime.spawn_blocking(move || {
            if job_flag.is_cancelled() {
                return;
            }
            let result = job(&job_flag);
            if tx.send(result).is_err() {
                tracing::debug!("background result dropped, receiver gone");
            }
        });

        CancelableComputation::new(
            async move {
                rx.await.unwrap_or_else(|_| {
                    Err(ForecastError::TaskFailed(
                        "background job ended without a result".to_string(),
                    ))
                })
            },
            flag,
        )
    }
}
