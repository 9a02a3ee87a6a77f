//! Job request and result model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rydberg_isa::{ExecutionLog, HardwareConfig, Instruction, IsaVersion, MeasurementRecord};
use rydberg_noise::SimpleNoiseConfig;
use rydberg_sched::TimelineEntry;

fn default_shots() -> u32 {
    1
}

/// A simulation job as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Caller-assigned job id; the runner generates one when empty.
    #[serde(default)]
    pub job_id: String,
    /// Device the job targets.
    #[serde(default)]
    pub device_id: String,
    /// Optional device profile name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Hardware descriptor.
    pub hardware: HardwareConfig,
    /// The program to execute.
    pub program: Vec<Instruction>,
    /// Number of shots; clamped to at least 1.
    #[serde(default = "default_shots")]
    pub shots: u32,
    /// Worker-thread cap; 0 selects the hardware concurrency.
    #[serde(default)]
    pub max_threads: usize,
    /// Free-form metadata; also carries validator opt-in keys.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// ISA version the program was compiled against.
    #[serde(default)]
    pub isa_version: IsaVersion,
    /// Stochastic noise configuration.
    #[serde(default, rename = "noise", skip_serializing_if = "Option::is_none")]
    pub noise_config: Option<SimpleNoiseConfig>,
    /// Explicit per-shot seeds; must match `shots` when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shot_seeds: Vec<u64>,
}

impl JobRequest {
    /// Create a minimal request for `hardware` and `program`.
    pub fn new(hardware: HardwareConfig, program: Vec<Instruction>) -> Self {
        Self {
            job_id: String::new(),
            device_id: String::new(),
            profile: None,
            hardware,
            program,
            shots: 1,
            max_threads: 0,
            metadata: BTreeMap::new(),
            isa_version: IsaVersion::default(),
            noise_config: None,
            shot_seeds: Vec::new(),
        }
    }

    /// Set the shot count.
    #[must_use]
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    /// Set explicit per-shot seeds.
    #[must_use]
    pub fn with_shot_seeds(mut self, seeds: Vec<u64>) -> Self {
        self.shot_seeds = seeds;
        self
    }

    /// Set the noise configuration.
    #[must_use]
    pub fn with_noise(mut self, noise: SimpleNoiseConfig) -> Self {
        self.noise_config = Some(noise);
        self
    }

    /// Set the worker-thread cap.
    #[must_use]
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet running.
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error; see `message`.
    Failed,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a job run.
///
/// `scheduler_timeline` is the raw nanosecond plan; `timeline` and the log
/// times are microsecond copies for external consumers. The `*_units`
/// fields carry the conversion tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Job id the result belongs to.
    pub job_id: String,
    /// Final status.
    pub status: JobStatus,
    /// Measurement records, concatenated in ascending shot order.
    pub measurements: Vec<MeasurementRecord>,
    /// Structured logs, concatenated in ascending shot order.
    pub logs: Vec<ExecutionLog>,
    /// Microsecond copy of the scheduler plan.
    pub timeline: Vec<TimelineEntry>,
    /// Nanosecond scheduler plan.
    pub scheduler_timeline: Vec<TimelineEntry>,
    /// Unit of the log `time` fields.
    pub log_time_units: String,
    /// Unit of `timeline`.
    pub timeline_units: String,
    /// Unit of `scheduler_timeline`.
    pub scheduler_timeline_units: String,
    /// Wall-clock runtime in seconds.
    pub elapsed_time: f64,
    /// Completion timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Error description when failed, empty otherwise.
    pub message: String,
}

impl JobResult {
    /// Create an empty pending result for `job_id`.
    pub fn pending(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            measurements: Vec::new(),
            logs: Vec::new(),
            timeline: Vec::new(),
            scheduler_timeline: Vec::new(),
            log_time_units: "ns".into(),
            timeline_units: "ns".into(),
            scheduler_timeline_units: "ns".into(),
            elapsed_time: 0.0,
            finished_at: None,
            message: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(JobStatus::Pending.to_string(), "pending");
        assert_eq!(JobStatus::Failed.to_string(), "failed");
        assert_eq!(
            serde_json::to_value(JobStatus::Completed).unwrap(),
            serde_json::json!("completed")
        );
        assert!(JobStatus::Completed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn test_request_round_trip() {
        let hw = HardwareConfig {
            positions: vec![0.0, 1.0],
            blockade_radius: 1.5,
            ..HardwareConfig::default()
        };
        let request = JobRequest::new(
            hw,
            vec![
                Instruction::alloc_array(2),
                Instruction::gate("H", [1]),
                Instruction::measure([0, 1]),
            ],
        )
        .with_shots(16)
        .with_shot_seeds(vec![1, 2]);

        let json = serde_json::to_string(&request).unwrap();
        let back: JobRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_request_noise_field_is_named_noise() {
        let request = JobRequest::new(
            HardwareConfig::default(),
            vec![Instruction::alloc_array(1)],
        )
        .with_noise(SimpleNoiseConfig {
            p_loss: 0.5,
            ..SimpleNoiseConfig::default()
        });
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["noise"]["p_loss"], 0.5);
    }

    #[test]
    fn test_sparse_request_defaults() {
        let request: JobRequest = serde_json::from_str(
            r#"{
                "hardware": {"positions": [0.0]},
                "program": [{"op": "AllocArray", "n_qubits": 1}]
            }"#,
        )
        .unwrap();
        assert_eq!(request.shots, 1);
        assert_eq!(request.max_threads, 0);
        assert_eq!(request.isa_version, IsaVersion::new(1, 1));
        assert!(request.noise_config.is_none());
        assert!(request.shot_seeds.is_empty());
    }
}
