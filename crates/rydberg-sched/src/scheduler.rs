//! The timing-annotation pass.

use rustc_hash::FxHashMap;
use tracing::debug;

use rydberg_isa::{Gate, HardwareConfig, Instruction, TimingLimits};

use crate::timeline::TimelineEntry;

/// Output of [`schedule_program`]: the rewritten program and its plan.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleResult {
    /// The input program with legal `Wait` instructions inserted.
    pub program: Vec<Instruction>,
    /// Nanosecond-resolution plan of every operation.
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone)]
struct ActiveOp {
    end_time: f64,
    arity: usize,
    zones: Vec<i32>,
}

#[derive(Debug, Default)]
struct SchedulingState {
    logical_time: f64,
    last_measurement_time: Vec<f64>,
    qubit_ready_time: Vec<f64>,
    qubit_zones: Vec<i32>,
    active_ops: Vec<ActiveOp>,
    active_single_qubit: u32,
    active_multi_qubit: u32,
    active_zone_counts: FxHashMap<i32, u32>,
    timeline: Vec<TimelineEntry>,
}

impl SchedulingState {
    fn record_timeline(&mut self, start_time: f64, duration: f64, op: &str, detail: String) {
        self.timeline
            .push(TimelineEntry::new(start_time, duration, op, detail));
    }

    fn sync_all_qubits_to_time(&mut self) {
        for ready in &mut self.qubit_ready_time {
            if *ready < self.logical_time {
                *ready = self.logical_time;
            }
        }
    }

    /// Retire every active gate whose end time has passed `current_time`.
    fn prune_active_ops(&mut self, current_time: f64) {
        let mut idx = 0;
        while idx < self.active_ops.len() {
            if self.active_ops[idx].end_time <= current_time {
                let op = self.active_ops.swap_remove(idx);
                if op.arity <= 1 {
                    self.active_single_qubit = self.active_single_qubit.saturating_sub(1);
                } else {
                    self.active_multi_qubit = self.active_multi_qubit.saturating_sub(1);
                }
                for zone in op.zones {
                    if let Some(count) = self.active_zone_counts.get_mut(&zone) {
                        *count -= 1;
                        if *count == 0 {
                            self.active_zone_counts.remove(&zone);
                        }
                    }
                }
            } else {
                idx += 1;
            }
        }
    }

    fn next_active_completion(&self) -> f64 {
        self.active_ops
            .iter()
            .map(|op| op.end_time)
            .fold(f64::INFINITY, f64::min)
    }

    fn zones_for_targets(&self, targets: &[usize]) -> Vec<i32> {
        let mut zones = Vec::with_capacity(targets.len());
        for &target in targets {
            let zone = self.qubit_zones.get(target).copied().unwrap_or(0);
            if !zones.contains(&zone) {
                zones.push(zone);
            }
        }
        if zones.is_empty() {
            zones.push(0);
        }
        zones
    }

    fn parallel_limits_satisfied(
        &self,
        limits: &TimingLimits,
        arity: usize,
        zones: &[i32],
    ) -> bool {
        if arity <= 1 {
            if limits.max_parallel_single_qubit > 0
                && self.active_single_qubit + 1 > limits.max_parallel_single_qubit
            {
                return false;
            }
        } else if limits.max_parallel_two_qubit > 0
            && self.active_multi_qubit + 1 > limits.max_parallel_two_qubit
        {
            return false;
        }
        if limits.max_parallel_per_zone > 0 {
            for zone in zones {
                let current = self.active_zone_counts.get(zone).copied().unwrap_or(0);
                if current + 1 > limits.max_parallel_per_zone {
                    return false;
                }
            }
        }
        true
    }

    /// Push `start_time` forward past active-gate completions until the
    /// parallelism limits admit one more gate of this shape.
    fn enforce_parallel_limits(
        &mut self,
        limits: &TimingLimits,
        arity: usize,
        zones: &[i32],
        start_time: f64,
    ) -> f64 {
        if limits.max_parallel_single_qubit == 0
            && limits.max_parallel_two_qubit == 0
            && limits.max_parallel_per_zone == 0
        {
            return start_time;
        }
        let mut candidate = start_time;
        loop {
            self.prune_active_ops(candidate);
            if self.parallel_limits_satisfied(limits, arity, zones) {
                return candidate;
            }
            let next_time = self.next_active_completion();
            if !next_time.is_finite() {
                return candidate;
            }
            candidate = candidate.max(next_time);
        }
    }

    fn track_active_gate(&mut self, arity: usize, zones: Vec<i32>, end_time: f64) {
        if arity <= 1 {
            self.active_single_qubit += 1;
        } else {
            self.active_multi_qubit += 1;
        }
        for &zone in &zones {
            *self.active_zone_counts.entry(zone).or_insert(0) += 1;
        }
        self.active_ops.push(ActiveOp {
            end_time,
            arity,
            zones,
        });
    }

    /// Push `candidate_start` past every active gate so a measurement never
    /// overlaps gate execution.
    fn align_with_idle_window(&mut self, candidate_start: f64) -> f64 {
        let mut start = candidate_start;
        loop {
            self.prune_active_ops(start);
            if self.active_ops.is_empty() {
                return start;
            }
            let next_time = self.next_active_completion();
            if !next_time.is_finite() {
                return start;
            }
            start = start.max(next_time);
        }
    }

    /// Emit `Wait` instructions totalling at least `duration`, chunked to
    /// respect the configured min/max wait window. A positive minimum may
    /// overshoot the requested duration; legal chunks win over exactness.
    fn append_wait_instruction(
        &mut self,
        out: &mut Vec<Instruction>,
        duration: f64,
        limits: &TimingLimits,
        detail: &str,
    ) {
        if duration <= 0.0 {
            return;
        }
        let mut remaining = duration;
        while remaining > 0.0 {
            let mut chunk = remaining;
            if limits.max_wait_ns > 0.0 && chunk > limits.max_wait_ns {
                chunk = limits.max_wait_ns;
            }
            if limits.min_wait_ns > 0.0 && chunk < limits.min_wait_ns {
                chunk = limits.min_wait_ns;
            }
            if chunk <= 0.0 {
                chunk = if limits.min_wait_ns > 0.0 {
                    limits.min_wait_ns
                } else {
                    remaining
                };
            }
            let start_time = self.logical_time;
            out.push(Instruction::wait(chunk));
            self.logical_time += chunk;
            self.sync_all_qubits_to_time();
            let detail_with_duration = if detail.is_empty() {
                describe_wait(chunk)
            } else {
                format!("{detail} {}", describe_wait(chunk))
            };
            self.record_timeline(start_time, chunk, "Wait", detail_with_duration);
            remaining -= chunk;
        }
    }

    fn enforce_measurement_cooldown(
        &mut self,
        out: &mut Vec<Instruction>,
        hw: &HardwareConfig,
        gate: &Gate,
    ) {
        let cooldown = hw.timing_limits.measurement_cooldown_ns;
        if cooldown <= 0.0 {
            return;
        }
        let mut target_time = self.logical_time;
        for &target in &gate.targets {
            if let Some(&last) = self.last_measurement_time.get(target) {
                target_time = target_time.max(last + cooldown);
            }
        }
        if target_time > self.logical_time {
            let gap = target_time - self.logical_time;
            self.append_wait_instruction(
                out,
                gap,
                &hw.timing_limits,
                "Inserted for measurement cooldown",
            );
        }
    }
}

fn format_targets(targets: &[usize]) -> String {
    let inner = targets
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("[{inner}]")
}

fn describe_gate(gate: &Gate) -> String {
    format!(
        "{} targets={} param={}",
        gate.name,
        format_targets(&gate.targets),
        gate.param
    )
}

fn describe_measure(targets: &[usize]) -> String {
    format!("targets={}", format_targets(targets))
}

fn describe_wait(duration: f64) -> String {
    format!("duration_ns={duration}")
}

fn describe_pulse(target: usize, detuning: f64, duration_ns: f64) -> String {
    format!("target={target} detuning={detuning} duration_ns={duration_ns}")
}

/// Rewrite `program` into a schedule legal for `hardware_config`.
///
/// Inserts `Wait` instructions for measurement cooldown and scheduling
/// gaps, serializes measurements against active gates, and honors the
/// parallelism limits by delaying gate starts. Pure and deterministic for a
/// fixed input pair.
pub fn schedule_program(
    program: &[Instruction],
    hardware_config: &HardwareConfig,
) -> ScheduleResult {
    let mut scheduled = Vec::with_capacity(program.len());
    let mut state = SchedulingState::default();
    let site_lookup = hardware_config.build_site_index();

    for instr in program {
        match instr {
            Instruction::AllocArray { n_qubits } => {
                scheduled.push(instr.clone());
                let n = *n_qubits;
                state.logical_time = 0.0;
                state.last_measurement_time = vec![f64::NEG_INFINITY; n];
                state.qubit_ready_time = vec![0.0; n];
                state.qubit_zones = (0..n)
                    .map(|slot| hardware_config.zone_for_slot(&site_lookup, slot))
                    .collect();
                state.active_ops.clear();
                state.active_single_qubit = 0;
                state.active_multi_qubit = 0;
                state.active_zone_counts.clear();
            }
            Instruction::ApplyGate(gate) => {
                state.enforce_measurement_cooldown(&mut scheduled, hardware_config, gate);

                let duration = hardware_config
                    .find_native_gate(&gate.name, gate.arity())
                    .map(|native| native.duration_ns)
                    .unwrap_or(0.0);

                let mut start_time = 0.0_f64;
                for &target in &gate.targets {
                    if let Some(&ready) = state.qubit_ready_time.get(target) {
                        start_time = start_time.max(ready);
                    }
                }
                let zones = state.zones_for_targets(&gate.targets);
                start_time = state.enforce_parallel_limits(
                    &hardware_config.timing_limits,
                    gate.arity(),
                    &zones,
                    start_time,
                );
                if start_time > state.logical_time {
                    let gap = start_time - state.logical_time;
                    state.append_wait_instruction(
                        &mut scheduled,
                        gap,
                        &hardware_config.timing_limits,
                        "Inserted for scheduling gap",
                    );
                }
                scheduled.push(instr.clone());
                let end_time = start_time + duration;
                state.record_timeline(start_time, duration, "ApplyGate", describe_gate(gate));
                if duration > 0.0 {
                    state.track_active_gate(gate.arity(), zones, end_time);
                }
                for &target in &gate.targets {
                    if let Some(ready) = state.qubit_ready_time.get_mut(target) {
                        *ready = end_time;
                    }
                }
                state.logical_time = state.logical_time.max(start_time) + duration;
            }
            Instruction::Measure { targets } => {
                let mut start_time = state.logical_time;
                for &target in targets {
                    if let Some(&ready) = state.qubit_ready_time.get(target) {
                        start_time = start_time.max(ready);
                    }
                }
                start_time = state.align_with_idle_window(start_time);
                if start_time > state.logical_time {
                    let gap = start_time - state.logical_time;
                    state.append_wait_instruction(
                        &mut scheduled,
                        gap,
                        &hardware_config.timing_limits,
                        "Inserted before measurement",
                    );
                }
                scheduled.push(instr.clone());
                let duration = hardware_config.timing_limits.measurement_duration_ns;
                state.logical_time = state.logical_time.max(start_time) + duration;
                for &target in targets {
                    if let Some(last) = state.last_measurement_time.get_mut(target) {
                        *last = state.logical_time;
                    }
                    if let Some(ready) = state.qubit_ready_time.get_mut(target) {
                        *ready = state.logical_time;
                    }
                }
                state.sync_all_qubits_to_time();
                state.record_timeline(start_time, duration, "Measure", describe_measure(targets));
            }
            Instruction::Wait { duration_ns } => {
                scheduled.push(instr.clone());
                let start_time = state.logical_time;
                state.logical_time += duration_ns;
                state.sync_all_qubits_to_time();
                state.record_timeline(start_time, *duration_ns, "Wait", describe_wait(*duration_ns));
            }
            Instruction::Pulse {
                target,
                detuning,
                duration_ns,
            } => {
                scheduled.push(instr.clone());
                let start_time = state.logical_time;
                state.logical_time += duration_ns;
                state.sync_all_qubits_to_time();
                state.record_timeline(
                    start_time,
                    *duration_ns,
                    "Pulse",
                    describe_pulse(*target, *detuning, *duration_ns),
                );
            }
            Instruction::MoveAtom { .. } => {
                scheduled.push(instr.clone());
            }
        }
    }

    debug!(
        input_len = program.len(),
        output_len = scheduled.len(),
        "scheduled program"
    );
    ScheduleResult {
        program: scheduled,
        timeline: state.timeline,
    }
}
