//! Trait for progress callbacks

use crate::model::Progress;

/// Receives progress checkpoints synchronously from the thread doing the work.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &Progress);
}

impl<F> ProgressObserver for F
where
    F: Fn(&Progress) + Send + Sync,
{
    fn on_progress(&self, progress: &Progress) {
        self(progress)
    }
}
