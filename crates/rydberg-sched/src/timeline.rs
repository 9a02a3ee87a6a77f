//! Scheduler plan entries.

use serde::{Deserialize, Serialize};

/// One planned operation on the device timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Start time of the operation.
    pub start_time: f64,
    /// Duration of the operation.
    pub duration: f64,
    /// Op name (`"ApplyGate"`, `"Measure"`, `"Wait"`, `"Pulse"`).
    pub op: String,
    /// Human-readable operand description.
    pub detail: String,
}

impl TimelineEntry {
    /// Create a timeline entry.
    pub fn new(
        start_time: f64,
        duration: f64,
        op: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            start_time,
            duration,
            op: op.into(),
            detail: detail.into(),
        }
    }

    /// End time of the operation.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_time() {
        let entry = TimelineEntry::new(10.0, 5.0, "Wait", "duration_ns=5");
        assert_eq!(entry.end_time(), 15.0);
    }

    #[test]
    fn test_serde_round_trip() {
        let entry = TimelineEntry::new(0.0, 200.0, "ApplyGate", "CX targets=[0,1] param=0");
        let json = serde_json::to_string(&entry).unwrap();
        let back: TimelineEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
