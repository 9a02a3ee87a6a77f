//! Multi-shot job execution.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::Utc;
use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_mt::Mt19937GenRand64;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use rydberg_engine::{CpuStateBackend, ProgressReporter, StateBackend, StatevectorEngine};
use rydberg_isa::{
    supported_versions_string, ExecutionLog, HardwareConfig, IsaVersion, MeasurementRecord,
    VmError, VmResult,
};
use rydberg_noise::{NoiseEngine, SimpleNoiseEngine};
use rydberg_sched::{schedule_program, ScheduleResult, TimelineEntry};

use crate::job::{JobRequest, JobResult, JobStatus};
use crate::validation::make_validator_registry_for;

const NS_PER_US: f64 = 1000.0;

/// Execution backend selector. CPU is the only core backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// In-memory statevector on the host CPU.
    #[default]
    Cpu,
}

/// Resolved execution profile for a device: hardware, noise, backend.
pub struct DeviceProfile {
    /// Device identifier.
    pub id: String,
    /// ISA version the device speaks.
    pub isa_version: IsaVersion,
    /// Hardware descriptor handed to every shot.
    pub hardware: HardwareConfig,
    /// Shared noise model; each shot receives a private clone.
    pub noise_engine: Option<Arc<dyn NoiseEngine>>,
    /// Backend selector.
    pub backend: BackendKind,
}

impl std::fmt::Debug for DeviceProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceProfile")
            .field("id", &self.id)
            .field("isa_version", &self.isa_version)
            .field("hardware", &self.hardware)
            .field("noise_engine", &self.noise_engine.is_some())
            .field("backend", &self.backend)
            .finish()
    }
}

impl DeviceProfile {
    /// Build a profile from a job request.
    ///
    /// Rejects unsupported ISA versions and invalid noise configurations.
    pub fn from_request(job: &JobRequest) -> VmResult<Self> {
        if !job.isa_version.is_supported() {
            return Err(VmError::UnsupportedVersion {
                requested: job.isa_version.to_string(),
                supported: supported_versions_string(),
            });
        }
        let noise_engine = match &job.noise_config {
            Some(config) => {
                let engine = SimpleNoiseEngine::new(config)?;
                Some(Arc::new(engine) as Arc<dyn NoiseEngine>)
            }
            None => None,
        };
        Ok(Self {
            id: job.device_id.clone(),
            isa_version: job.isa_version,
            hardware: job.hardware.clone(),
            noise_engine,
            backend: BackendKind::default(),
        })
    }

    fn make_backend(&self) -> Box<dyn StateBackend> {
        match self.backend {
            BackendKind::Cpu => Box::new(CpuStateBackend::new()),
        }
    }
}

#[derive(Debug, Default)]
struct ShotOutput {
    measurements: Vec<MeasurementRecord>,
    logs: Vec<ExecutionLog>,
}

struct ExecOutput {
    measurements: Vec<MeasurementRecord>,
    logs: Vec<ExecutionLog>,
    schedule: ScheduleResult,
}

fn derive_shot_seeds(explicit: &[u64], shots: usize) -> VmResult<Vec<u64>> {
    if !explicit.is_empty() {
        if explicit.len() != shots {
            return Err(VmError::InvalidArgument(format!(
                "shot seeds must match the requested shots ({} seeds for {shots} shots)",
                explicit.len()
            )));
        }
        return Ok(explicit.to_vec());
    }
    let mut master = Mt19937GenRand64::seed_from_u64(OsRng.next_u64());
    Ok((0..shots).map(|_| master.next_u64()).collect())
}

fn timeline_to_us(entries: &[TimelineEntry]) -> Vec<TimelineEntry> {
    entries
        .iter()
        .map(|entry| {
            TimelineEntry::new(
                entry.start_time / NS_PER_US,
                entry.duration / NS_PER_US,
                entry.op.clone(),
                entry.detail.clone(),
            )
        })
        .collect()
}

fn logs_to_us(logs: &[ExecutionLog]) -> Vec<ExecutionLog> {
    logs.iter()
        .map(|log| ExecutionLog {
            shot: log.shot,
            time: log.time / NS_PER_US,
            category: log.category,
            message: log.message.clone(),
        })
        .collect()
}

/// Schedules, validates, and executes jobs shot-parallel on native threads.
#[derive(Debug, Default)]
pub struct JobRunner;

impl JobRunner {
    /// Create a runner.
    pub fn new() -> Self {
        Self
    }

    /// Execute `job` and return its result.
    ///
    /// `max_threads` overrides the request's own cap when positive. Errors
    /// never propagate as `Err`: a failed run yields a `Failed` result whose
    /// `message` carries the description, and partial measurements are
    /// discarded.
    #[instrument(skip_all, fields(job_id = %job.job_id, shots = job.shots))]
    pub fn run(
        &self,
        job: &JobRequest,
        max_threads: usize,
        reporter: Option<Arc<dyn ProgressReporter>>,
    ) -> JobResult {
        let started = Instant::now();
        let job_id = if job.job_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            job.job_id.clone()
        };
        let mut result = JobResult::pending(job_id);

        match self.execute(job, max_threads, reporter) {
            Ok(output) => {
                result.status = JobStatus::Completed;
                result.measurements = output.measurements;
                result.timeline = timeline_to_us(&output.schedule.timeline);
                result.timeline_units = "us".into();
                result.logs = logs_to_us(&output.logs);
                result.log_time_units = "us".into();
                result.scheduler_timeline = output.schedule.timeline;
                result.scheduler_timeline_units = "ns".into();
            }
            Err(err) => {
                warn!(error = %err, "job failed");
                result.status = JobStatus::Failed;
                result.message = err.to_string();
            }
        }
        result.elapsed_time = started.elapsed().as_secs_f64();
        result.finished_at = Some(Utc::now());
        result
    }

    fn execute(
        &self,
        job: &JobRequest,
        max_threads: usize,
        reporter: Option<Arc<dyn ProgressReporter>>,
    ) -> VmResult<ExecOutput> {
        let profile = DeviceProfile::from_request(job)?;
        make_validator_registry_for(job, &profile.hardware)
            .run_all(&profile.hardware, &job.program)?;

        let schedule = schedule_program(&job.program, &profile.hardware);
        let shots = job.shots.max(1) as usize;
        let seeds = derive_shot_seeds(&job.shot_seeds, shots)?;

        if let Some(reporter) = &reporter {
            reporter.set_total_steps(schedule.program.len() * shots);
        }

        let thread_cap = if max_threads > 0 {
            max_threads
        } else {
            job.max_threads
        };
        let worker_limit = if thread_cap > 0 {
            thread_cap
        } else {
            std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1)
        };
        let worker_count = shots.min(worker_limit).max(1);
        debug!(shots, worker_count, "dispatching shot workers");

        let mut outputs: Vec<ShotOutput> = (0..shots).map(|_| ShotOutput::default()).collect();
        let failure: Mutex<Option<VmError>> = Mutex::new(None);

        std::thread::scope(|scope| {
            let base = shots / worker_count;
            let remainder = shots % worker_count;
            let mut remaining = outputs.as_mut_slice();
            let mut shot_offset = 0usize;

            for worker_idx in 0..worker_count {
                let count = base + usize::from(worker_idx < remainder);
                if count == 0 {
                    continue;
                }
                let (slice, rest) = std::mem::take(&mut remaining).split_at_mut(count);
                remaining = rest;
                let start = shot_offset;
                shot_offset += count;

                let profile = &profile;
                let schedule = &schedule;
                let seeds = &seeds;
                let failure = &failure;
                let reporter = reporter.clone();

                scope.spawn(move || {
                    for (offset, slot) in slice.iter_mut().enumerate() {
                        let shot = start + offset;
                        let mut engine = StatevectorEngine::with_backend(
                            profile.hardware.clone(),
                            profile.make_backend(),
                            seeds[shot],
                        );
                        if let Some(reporter) = &reporter {
                            engine.set_progress_reporter(reporter.clone());
                        }
                        engine.set_shot_index(shot);
                        if let Some(noise) = &profile.noise_engine {
                            engine.set_noise_model(Some(noise.as_ref()));
                        }
                        match engine.run(&schedule.program) {
                            Ok(()) => {
                                slot.measurements = engine.state().measurements.clone();
                                slot.logs = engine.logs().to_vec();
                            }
                            Err(err) => {
                                let mut guard = failure
                                    .lock()
                                    .unwrap_or_else(PoisonError::into_inner);
                                if guard.is_none() {
                                    *guard = Some(err);
                                }
                                return;
                            }
                        }
                    }
                });
            }
        });

        if let Some(err) = failure
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(err);
        }

        let mut measurements = Vec::new();
        let mut logs = Vec::new();
        for output in outputs {
            measurements.extend(output.measurements);
            logs.extend(output.logs);
        }
        Ok(ExecOutput {
            measurements,
            logs,
            schedule,
        })
    }
}
