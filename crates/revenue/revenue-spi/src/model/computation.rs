//! Cancelable computation handle
//!
//! A [`CancelableComputation`] is a future over a forecast result that can
//! be cancelled from the outside. Cancellation is best-effort for the work
//! itself (the job observes a [`CancelFlag`] at its checkpoints) but exact
//! for delivery: once `cancel()` has been called on an unsettled
//! computation, awaiting it yields [`ForecastError::Cancelled`] and never the
//! result. Cancelling is idempotent, a no-op after the computation settled,
//! and happens implicitly when the handle is dropped.

use crate::error::{ForecastError, Result};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

type BoxedTask<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

#[derive(Default)]
struct FlagState {
    cancelled: AtomicBool,
    waker: Mutex<Option<Waker>>,
}

/// Shared cancellation flag between a computation handle and its job.
#[derive(Clone, Default)]
pub struct CancelFlag {
    state: Arc<FlagState>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Returns `true` only for the call that raised it.
    pub fn cancel(&self) -> bool {
        let first = !self.state.cancelled.swap(true, Ordering::AcqRel);
        if first {
            let waker = self
                .state
                .waker
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .take();
            if let Some(waker) = waker {
                waker.wake();
            }
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once the flag is raised; jobs call this at checkpoints.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ForecastError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn register(&self, waker: &Waker) {
        let mut slot = self
            .state
            .waker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.as_ref() {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }
}

impl fmt::Debug for CancelFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelFlag")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Detached cancel capability for a computation, e.g. for a request tracker
/// that must cancel work it does not own. Handles of already-resolved
/// computations do nothing.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Option<CancelFlag>);

impl CancelHandle {
    /// A handle that cancels nothing.
    pub fn noop() -> Self {
        Self(None)
    }

    pub fn cancel(&self) {
        if let Some(flag) = &self.0 {
            flag.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// A pending result with a `cancel()` operation.
pub struct CancelableComputation<T> {
    task: Option<BoxedTask<T>>,
    flag: Option<CancelFlag>,
}

impl<T: Send + 'static> CancelableComputation<T> {
    /// Wrap a future whose producer watches `flag`.
    pub fn new<F>(future: F, flag: CancelFlag) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            task: Some(Box::pin(future)),
            flag: Some(flag),
        }
    }

    /// An already-settled computation; `cancel()` on it is a no-op.
    pub fn resolved(result: Result<T>) -> Self {
        Self {
            task: Some(Box::pin(std::future::ready(result))),
            flag: None,
        }
    }

    pub fn ready(value: T) -> Self {
        Self::resolved(Ok(value))
    }

    /// Transform the eventual value, keeping the same cancellation flag.
    pub fn map<U, F>(mut self, f: F) -> CancelableComputation<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let flag = self.flag.take();
        let task = self.task.take().map(|task| -> BoxedTask<U> {
            Box::pin(async move { task.await.map(f) })
        });
        CancelableComputation { task, flag }
    }
}

impl<T> CancelableComputation<T> {
    /// Request cancellation. Safe to call any number of times, and a no-op
    /// once the computation has settled.
    pub fn cancel(&self) {
        if self.task.is_some() {
            if let Some(flag) = &self.flag {
                flag.cancel();
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    /// Whether the result has already been delivered.
    pub fn is_settled(&self) -> bool {
        self.task.is_none()
    }

    /// Whether this computation runs off the calling thread.
    pub fn is_background(&self) -> bool {
        self.flag.is_some()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.flag.clone())
    }
}

impl<T> Future for CancelableComputation<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.task.is_none() {
            return Poll::Ready(Err(ForecastError::TaskFailed(
                "computation polled after completion".to_string(),
            )));
        }

        // Register before checking so a concurrent cancel always wakes us.
        if let Some(flag) = &this.flag {
            flag.register(cx.waker());
            if flag.is_cancelled() {
                this.task = None;
                return Poll::Ready(Err(ForecastError::Cancelled));
            }
        }

        let poll = match this.task.as_mut() {
            Some(task) => task.as_mut().poll(cx),
            None => return Poll::Pending,
        };
        if poll.is_ready() {
            this.task = None;
        }
        poll
    }
}

impl<T> Drop for CancelableComputation<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T> fmt::Debug for CancelableComputation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelableComputation")
            .field("settled", &self.is_settled())
            .field("background", &self.is_background())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Either an immediate value or a cancelable computation producing one.
#[derive(Debug)]
pub enum Outcome<T> {
    Ready(T),
    Pending(CancelableComputation<T>),
}

impl<T: Send + 'static> Outcome<T> {
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            Outcome::Ready(value) => Outcome::Ready(f(value)),
            Outcome::Pending(computation) => Outcome::Pending(computation.map(f)),
        }
    }

    /// View as a computation; ready values become an already-resolved one.
    pub fn into_computation(self) -> CancelableComputation<T> {
        match self {
            Outcome::Ready(value) => CancelableComputation::ready(value),
            Outcome::Pending(computation) => computation,
        }
    }

    /// Wait for the value.
    pub async fn resolve(self) -> Result<T> {
        match self {
            Outcome::Ready(value) => Ok(value),
            Outcome::Pending(computation) => computation.await,
        }
    }
}

impl<T> Outcome<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Pending(_) => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Pending(_) => None,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        match self {
            Outcome::Ready(_) => CancelHandle::noop(),
            Outcome::Pending(computation) => computation.cancel_handle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_resolved_computation_ignores_cancel() {
        let computation = CancelableComputation::ready(42);
        computation.cancel();
        computation.cancel();
        assert!(!computation.is_background());
        assert_eq!(computation.await, Ok(42));
    }

    #[tokio::test]
    async fn test_cancel_before_completion_yields_cancelled() {
        let flag = CancelFlag::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<Result<u32>>();
        let computation = CancelableComputation::new(
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(ForecastError::TaskFailed("dropped".into())))
            },
            flag.clone(),
        );

        computation.cancel();
        computation.cancel();
        assert!(flag.is_cancelled());

        // A late result must not be delivered.
        let _ = tx.send(Ok(7));
        assert_eq!(computation.await, Err(ForecastError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_wakes_pending_waiter() {
        let flag = CancelFlag::new();
        let computation: CancelableComputation<u32> =
            CancelableComputation::new(std::future::pending(), flag);
        let handle = computation.cancel_handle();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(2), computation).await;
        assert_eq!(result, Ok(Err(ForecastError::Cancelled)));
    }

    #[tokio::test]
    async fn test_map_preserves_cancellation() {
        let flag = CancelFlag::new();
        let computation: CancelableComputation<u32> =
            CancelableComputation::new(std::future::pending(), flag.clone());
        let mapped = computation.map(|v| v * 2);
        mapped.cancel();
        assert!(flag.is_cancelled());
        assert_eq!(mapped.await, Err(ForecastError::Cancelled));
    }

    #[test]
    fn test_drop_cancels_unsettled_work() {
        let flag = CancelFlag::new();
        let computation: CancelableComputation<u32> =
            CancelableComputation::new(std::future::pending(), flag.clone());
        drop(computation);
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_flag_cancel_reports_first_call() {
        let flag = CancelFlag::new();
        assert!(flag.check().is_ok());
        assert!(flag.cancel());
        assert!(!flag.cancel());
        assert_eq!(flag.check(), Err(ForecastError::Cancelled));
    }

    #[tokio::test]
    async fn test_outcome_resolve_and_map() {
        let ready: Outcome<u32> = Outcome::Ready(3);
        assert_eq!(ready.map(|v| v + 1).resolve().await, Ok(4));

        let pending = Outcome::Pending(CancelableComputation::ready(5));
        assert!(pending.is_pending());
        assert_eq!(pending.resolve().await, Ok(5));
    }
}
