//! Job-level scenarios: orchestration, determinism, aggregation.

use std::sync::Arc;

use rydberg_engine::ProgressReporter;
use rydberg_isa::{HardwareConfig, Instruction, IsaVersion};
use rydberg_noise::SimpleNoiseConfig;
use rydberg_service::{JobProgressReporter, JobRequest, JobRunner, JobStatus};

fn chain_hw(positions: &[f64], blockade_radius: f64) -> HardwareConfig {
    HardwareConfig {
        positions: positions.to_vec(),
        blockade_radius,
        ..HardwareConfig::default()
    }
}

fn classical_x_request() -> JobRequest {
    JobRequest::new(
        chain_hw(&[0.0, 1.0], 1.0),
        vec![
            Instruction::alloc_array(2),
            Instruction::gate("X", [1]),
            Instruction::measure([0, 1]),
        ],
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn classical_x_single_shot() {
    init_tracing();
    let result = JobRunner::new().run(&classical_x_request(), 0, None);
    assert_eq!(result.status, JobStatus::Completed);
    assert!(result.message.is_empty());
    assert_eq!(result.measurements.len(), 1);
    assert_eq!(result.measurements[0].targets, vec![0, 1]);
    assert_eq!(result.measurements[0].bits, vec![0, 1]);
    assert!(result.finished_at.is_some());
}

#[test]
fn generates_job_id_when_empty() {
    let result = JobRunner::new().run(&classical_x_request(), 0, None);
    assert!(!result.job_id.is_empty());

    let mut request = classical_x_request();
    request.job_id = "job-17".into();
    let result = JobRunner::new().run(&request, 0, None);
    assert_eq!(result.job_id, "job-17");
}

#[test]
fn measurements_are_concatenated_in_shot_order() {
    let request = classical_x_request()
        .with_shots(8)
        .with_shot_seeds((0..8).map(|i| 1000 + i).collect());
    let result = JobRunner::new().run(&request, 3, None);
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.measurements.len(), 8);
    // Logs carry ascending shot indices regardless of completion order.
    let mut last_shot = 0;
    for log in &result.logs {
        assert!(log.shot >= last_shot);
        last_shot = log.shot;
    }
    assert_eq!(last_shot, 7);
}

#[test]
fn fixed_seeds_are_reproducible_across_thread_counts() {
    let seeds: Vec<u64> = (0..16).map(|i| 7 * i + 3).collect();
    let program = vec![
        Instruction::alloc_array(1),
        Instruction::gate("H", [0]),
        Instruction::measure([0]),
    ];
    let request = JobRequest::new(chain_hw(&[0.0], 0.0), program)
        .with_shots(16)
        .with_shot_seeds(seeds);

    let serial = JobRunner::new().run(&request.clone().with_max_threads(1), 0, None);
    let parallel = JobRunner::new().run(&request.with_max_threads(4), 0, None);
    assert_eq!(serial.status, JobStatus::Completed);
    assert_eq!(serial.measurements, parallel.measurements);
}

#[test]
fn permuting_seeds_permutes_results() {
    let program = vec![
        Instruction::alloc_array(1),
        Instruction::gate("H", [0]),
        Instruction::measure([0]),
    ];
    let base = JobRequest::new(chain_hw(&[0.0], 0.0), program).with_shots(2);

    let forward = JobRunner::new().run(&base.clone().with_shot_seeds(vec![41, 42]), 0, None);
    let reversed = JobRunner::new().run(&base.with_shot_seeds(vec![42, 41]), 0, None);

    assert_eq!(forward.measurements[0], reversed.measurements[1]);
    assert_eq!(forward.measurements[1], reversed.measurements[0]);
}

#[test]
fn per_gate_loss_resets_per_shot() {
    let mut noise = SimpleNoiseConfig::default();
    noise.loss_runtime.per_gate = 1.0;
    let request = JobRequest::new(
        chain_hw(&[0.0], 0.0),
        vec![
            Instruction::alloc_array(1),
            Instruction::gate("X", [0]),
            Instruction::measure([0]),
        ],
    )
    .with_shots(2)
    .with_shot_seeds(vec![11, 22])
    .with_noise(noise);

    let result = JobRunner::new().run(&request, 0, None);
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.measurements.len(), 2);
    assert_eq!(result.measurements[0].bits, vec![-1]);
    assert_eq!(result.measurements[1].bits, vec![-1]);
}

#[test]
fn readout_flip_applies_on_every_shot() {
    let mut noise = SimpleNoiseConfig::default();
    noise.readout.p_flip0_to_1 = 1.0;
    let request = JobRequest::new(
        chain_hw(&[0.0], 0.0),
        vec![Instruction::alloc_array(1), Instruction::measure([0])],
    )
    .with_shots(3)
    .with_shot_seeds(vec![1, 2, 3])
    .with_noise(noise);

    let result = JobRunner::new().run(&request, 0, None);
    assert_eq!(result.status, JobStatus::Completed);
    for record in &result.measurements {
        assert_eq!(record.bits, vec![1]);
    }
}

#[test]
fn unsupported_isa_version_fails_with_supported_list() {
    let mut request = classical_x_request();
    request.isa_version = IsaVersion::new(0, 9);
    let result = JobRunner::new().run(&request, 0, None);
    assert_eq!(result.status, JobStatus::Failed);
    assert!(result.message.contains("0.9"));
    assert!(result.message.contains("1.0, 1.1"));
    assert!(result.measurements.is_empty());
}

#[test]
fn seed_count_mismatch_fails() {
    let request = classical_x_request()
        .with_shots(3)
        .with_shot_seeds(vec![1, 2]);
    let result = JobRunner::new().run(&request, 0, None);
    assert_eq!(result.status, JobStatus::Failed);
    assert!(result.message.contains("shot seeds"));
}

#[test]
fn invalid_noise_config_fails() {
    let request = classical_x_request().with_noise(SimpleNoiseConfig {
        p_loss: 2.0,
        ..SimpleNoiseConfig::default()
    });
    let result = JobRunner::new().run(&request, 0, None);
    assert_eq!(result.status, JobStatus::Failed);
    assert!(result.message.contains("noise"));
}

#[test]
fn validator_rejects_blockade_violation_before_execution() {
    let request = JobRequest::new(
        chain_hw(&[0.0, 50.0], 1.0),
        vec![
            Instruction::alloc_array(2),
            Instruction::gate("CX", [0, 1]),
        ],
    );
    let result = JobRunner::new().run(&request, 0, None);
    assert_eq!(result.status, JobStatus::Failed);
    assert!(result.message.contains("blockade"));
    assert!(result.measurements.is_empty());
}

#[test]
fn engine_failure_discards_partial_results() {
    // Shot program fails at the second instruction on every shot.
    let request = JobRequest::new(
        chain_hw(&[0.0], 0.0),
        vec![
            Instruction::alloc_array(1),
            Instruction::measure([0]),
            Instruction::gate("Q", [0]),
        ],
    )
    .with_shots(4)
    .with_shot_seeds(vec![1, 2, 3, 4]);
    let result = JobRunner::new().run(&request, 2, None);
    assert_eq!(result.status, JobStatus::Failed);
    assert!(result.message.contains("unsupported gate"));
    assert!(result.measurements.is_empty());
}

#[test]
fn shots_are_clamped_to_at_least_one() {
    let request = classical_x_request().with_shots(0);
    let result = JobRunner::new().run(&request, 0, None);
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.measurements.len(), 1);
}

#[test]
fn timelines_carry_unit_tags() {
    let mut request = classical_x_request();
    request.hardware.native_gates.push(rydberg_isa::NativeGate {
        name: "X".into(),
        arity: 1,
        duration_ns: 500.0,
        angle_min: 0.0,
        angle_max: 0.0,
        connectivity: rydberg_isa::ConnectivityKind::AllToAll,
    });
    let result = JobRunner::new().run(&request, 0, None);
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.scheduler_timeline_units, "ns");
    assert_eq!(result.timeline_units, "us");
    assert_eq!(result.log_time_units, "us");

    let ns_gate = result
        .scheduler_timeline
        .iter()
        .find(|entry| entry.op == "ApplyGate")
        .unwrap();
    let us_gate = result
        .timeline
        .iter()
        .find(|entry| entry.op == "ApplyGate")
        .unwrap();
    assert_eq!(ns_gate.duration, 500.0);
    assert_eq!(us_gate.duration, 0.5);
}

#[test]
fn progress_reporter_sees_all_steps() {
    let reporter = Arc::new(JobProgressReporter::new());
    let request = classical_x_request()
        .with_shots(4)
        .with_shot_seeds(vec![1, 2, 3, 4]);
    let result = JobRunner::new().run(
        &request,
        2,
        Some(reporter.clone() as Arc<dyn ProgressReporter>),
    );
    assert_eq!(result.status, JobStatus::Completed);
    // 3 scheduled instructions × 4 shots.
    assert_eq!(reporter.total_steps(), 12);
    assert_eq!(reporter.completed_steps(), 12);
    assert_eq!(reporter.percent_complete(), 1.0);
    assert!(!reporter.recent_logs().is_empty());
}

#[test]
fn scheduled_waits_reach_the_engine() {
    // Cooldown forces the scheduler to insert a wait, and the engine then
    // accepts the gate that would otherwise violate the cooldown.
    let mut request = JobRequest::new(
        chain_hw(&[0.0], 0.0),
        vec![
            Instruction::alloc_array(1),
            Instruction::measure([0]),
            Instruction::gate("X", [0]),
            Instruction::measure([0]),
        ],
    );
    request.hardware.timing_limits.measurement_cooldown_ns = 5.0;

    let result = JobRunner::new().run(&request, 0, None);
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.measurements.len(), 2);
    assert_eq!(result.measurements[1].bits, vec![1]);
    assert!(result
        .scheduler_timeline
        .iter()
        .any(|entry| entry.op == "Wait"
            && entry.detail.contains("Inserted for measurement cooldown")));
}
