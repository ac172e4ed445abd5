//! Progress reporting model

use crate::model::TuningResult;

/// A progress checkpoint from a tuning search or a bootstrap run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Units of work done (grid cells, bootstrap trials)
    pub completed: usize,
    /// Total units of work
    pub total: usize,
    /// Best tuning result so far, for searches that track one
    pub best: Option<TuningResult>,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        Self {
            completed,
            total,
            best: None,
        }
    }

    pub fn with_best(mut self, best: TuningResult) -> Self {
        self.best = Some(best);
        self
    }

    /// Completion percentage in `[0, 100]`.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.completed as f64 / self.total as f64 * 100.0).min(100.0)
    }

    /// Checkpoint interval that yields roughly twenty reports over `total` units.
    pub fn interval(total: usize) -> usize {
        (total / 20).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(Progress::new(50, 200).percent(), 25.0);
        assert_eq!(Progress::new(0, 0).percent(), 100.0);
    }

    #[test]
    fn test_interval() {
        assert_eq!(Progress::interval(200), 10);
        assert_eq!(Progress::interval(5), 1);
    }
}
