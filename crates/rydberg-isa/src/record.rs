//! Classical execution outputs: measurement records and structured logs.

use serde::{Deserialize, Serialize};

/// Outcome of one `Measure` instruction.
///
/// `bits[i]` is the readout of `targets[i]`: `0`, `1`, or `-1` when the atom
/// was lost/erased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Measured qubit slots, in readout order.
    pub targets: Vec<usize>,
    /// Per-target bits; `-1` marks a lost atom.
    pub bits: Vec<i8>,
}

impl MeasurementRecord {
    /// Create a record from targets and bits.
    pub fn new(targets: Vec<usize>, bits: Vec<i8>) -> Self {
        Self { targets, bits }
    }
}

/// Category of a structured execution log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogCategory {
    /// Array allocation.
    AllocArray,
    /// Gate application.
    ApplyGate,
    /// Measurement.
    Measure,
    /// Atom move.
    MoveAtom,
    /// Idle wait.
    Wait,
    /// Raw pulse.
    Pulse,
    /// Timing-constraint context emitted just before a timing error.
    TimingConstraint,
    /// Stochastic-channel observation (readout flip, atom loss).
    Noise,
}

impl std::fmt::Display for LogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogCategory::AllocArray => "AllocArray",
            LogCategory::ApplyGate => "ApplyGate",
            LogCategory::Measure => "Measure",
            LogCategory::MoveAtom => "MoveAtom",
            LogCategory::Wait => "Wait",
            LogCategory::Pulse => "Pulse",
            LogCategory::TimingConstraint => "TimingConstraint",
            LogCategory::Noise => "Noise",
        };
        f.write_str(name)
    }
}

/// A structured log event emitted during shot execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
    /// Shot index the event belongs to.
    pub shot: usize,
    /// Logical time of the event; nanoseconds internally, the job boundary
    /// may convert.
    pub time: f64,
    /// Event category.
    pub category: LogCategory,
    /// Human-readable details.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_round_trip() {
        let record = MeasurementRecord::new(vec![0, 2], vec![1, -1]);
        let json = serde_json::to_string(&record).unwrap();
        let back: MeasurementRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_log_category_display() {
        assert_eq!(LogCategory::ApplyGate.to_string(), "ApplyGate");
        assert_eq!(LogCategory::TimingConstraint.to_string(), "TimingConstraint");
    }

    #[test]
    fn test_log_serializes_category_as_string() {
        let log = ExecutionLog {
            shot: 3,
            time: 12.0,
            category: LogCategory::Noise,
            message: "readout flip on qubit 0".into(),
        };
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["category"], "Noise");
        assert_eq!(json["shot"], 3);
    }
}
