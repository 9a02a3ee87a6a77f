//! Progress-reporting contract consumed by the engine.

use rydberg_isa::ExecutionLog;

/// Sink for execution progress and recent log events.
///
/// The engine calls [`increment_completed_steps`] after every instruction
/// and [`record_log`] for every structured log event, from the worker thread
/// running the shot. Implementations must be internally synchronized and
/// must not block the engine.
///
/// [`increment_completed_steps`]: ProgressReporter::increment_completed_steps
/// [`record_log`]: ProgressReporter::record_log
pub trait ProgressReporter: Send + Sync {
    /// Announce the total number of steps the run will take.
    fn set_total_steps(&self, total: usize);

    /// Add `delta` completed steps.
    fn increment_completed_steps(&self, delta: usize);

    /// Record a structured log event.
    fn record_log(&self, log: &ExecutionLog);
}
