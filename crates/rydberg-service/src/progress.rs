//! Thread-safe progress reporter for job execution.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rydberg_engine::ProgressReporter;
use rydberg_isa::ExecutionLog;

const MAX_RECENT_LOGS: usize = 8;

/// Default [`ProgressReporter`]: an atomic completed-step counter plus a
/// mutex-guarded ring of the most recent log events.
///
/// Engines call it from worker threads; pollers read snapshots from the
/// service side. Neither path blocks the other for more than a ring update.
#[derive(Debug, Default)]
pub struct JobProgressReporter {
    total_steps: AtomicUsize,
    completed_steps: AtomicUsize,
    recent_logs: Mutex<VecDeque<ExecutionLog>>,
}

impl JobProgressReporter {
    /// Create a reporter with no recorded progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total steps announced by the runner.
    pub fn total_steps(&self) -> usize {
        self.total_steps.load(Ordering::Relaxed)
    }

    /// Steps completed so far.
    pub fn completed_steps(&self) -> usize {
        self.completed_steps.load(Ordering::Relaxed)
    }

    /// Fraction of steps completed, clamped to `[0, 1]`.
    pub fn percent_complete(&self) -> f64 {
        let total = self.total_steps();
        if total == 0 {
            return 0.0;
        }
        (self.completed_steps() as f64 / total as f64).min(1.0)
    }

    /// Snapshot of the most recent log events, oldest first.
    pub fn recent_logs(&self) -> Vec<ExecutionLog> {
        self.recent_logs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl ProgressReporter for JobProgressReporter {
    fn set_total_steps(&self, total: usize) {
        self.total_steps.store(total, Ordering::Relaxed);
    }

    fn increment_completed_steps(&self, delta: usize) {
        self.completed_steps.fetch_add(delta, Ordering::Relaxed);
    }

    fn record_log(&self, log: &ExecutionLog) {
        let mut logs = self
            .recent_logs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if logs.len() == MAX_RECENT_LOGS {
            logs.pop_front();
        }
        logs.push_back(log.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rydberg_isa::LogCategory;

    fn log(message: &str) -> ExecutionLog {
        ExecutionLog {
            shot: 0,
            time: 0.0,
            category: LogCategory::Wait,
            message: message.into(),
        }
    }

    #[test]
    fn test_step_accounting() {
        let reporter = JobProgressReporter::new();
        reporter.set_total_steps(10);
        reporter.increment_completed_steps(3);
        reporter.increment_completed_steps(2);
        assert_eq!(reporter.total_steps(), 10);
        assert_eq!(reporter.completed_steps(), 5);
        assert!((reporter.percent_complete() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_percent_clamps_and_handles_zero_total() {
        let reporter = JobProgressReporter::new();
        assert_eq!(reporter.percent_complete(), 0.0);
        reporter.set_total_steps(2);
        reporter.increment_completed_steps(5);
        assert_eq!(reporter.percent_complete(), 1.0);
    }

    #[test]
    fn test_recent_logs_are_bounded() {
        let reporter = JobProgressReporter::new();
        for i in 0..20 {
            reporter.record_log(&log(&format!("event {i}")));
        }
        let logs = reporter.recent_logs();
        assert_eq!(logs.len(), MAX_RECENT_LOGS);
        assert_eq!(logs.first().unwrap().message, "event 12");
        assert_eq!(logs.last().unwrap().message, "event 19");
    }
}
