//! The per-shot statevector interpreter.

use std::sync::Arc;

use num_complex::Complex64;
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_mt::Mt19937GenRand64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rydberg_isa::{
    blockade_violation_reason, ConnectivityKind, ExecutionLog, Gate, HardwareConfig, Instruction,
    LogCategory, MeasurementRecord, NativeGate, SiteIndex, VmError, VmResult,
};
use rydberg_noise::{NoiseEngine, PrngStream};

use crate::backend::{CpuStateBackend, StateBackend};
use crate::progress::ProgressReporter;

const GRID_DISTANCE_EPSILON: f64 = 1e-9;

/// A pulse recorded during execution. Pulses never mutate amplitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseEvent {
    /// Qubit slot the pulse addressed.
    pub target: usize,
    /// Laser detuning.
    pub detuning: f64,
    /// Pulse duration in nanoseconds.
    pub duration_ns: f64,
}

/// Classical side-state of one shot.
#[derive(Debug, Clone)]
pub struct StatevectorState {
    /// Number of allocated qubits; 0 before the first `AllocArray`.
    pub n_qubits: usize,
    /// Hardware descriptor; `positions` are mutated by `MoveAtom`.
    pub hw: HardwareConfig,
    /// Logical clock in nanoseconds, advanced by `Wait`.
    pub logical_time: f64,
    /// Pulses recorded so far.
    pub pulse_log: Vec<PulseEvent>,
    /// Measurement records in program order.
    pub measurements: Vec<MeasurementRecord>,
    /// Structured log events.
    pub logs: Vec<ExecutionLog>,
    /// Shot index stamped on every log event.
    pub shot_index: usize,
    /// Per-qubit time of the most recent measurement, `-inf` when never.
    pub last_measurement_time: Vec<f64>,
    site_index: SiteIndex,
}

impl StatevectorState {
    fn new(hw: HardwareConfig) -> Self {
        let site_index = hw.build_site_index();
        Self {
            n_qubits: 0,
            hw,
            logical_time: 0.0,
            pulse_log: Vec::new(),
            measurements: Vec::new(),
            logs: Vec::new(),
            shot_index: 0,
            last_measurement_time: Vec::new(),
            site_index,
        }
    }
}

/// Statevector runtime for one shot of a neutral-atom ISA program.
pub struct StatevectorEngine {
    state: StatevectorState,
    noise: Option<Box<dyn NoiseEngine>>,
    rng: Mt19937GenRand64,
    backend: Box<dyn StateBackend>,
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl StatevectorEngine {
    /// Create an engine over the CPU backend with an entropy-derived seed.
    pub fn new(hw: HardwareConfig) -> Self {
        Self::with_backend(hw, Box::new(CpuStateBackend::new()), rand::random())
    }

    /// Create an engine over the CPU backend with a fixed seed.
    pub fn with_seed(hw: HardwareConfig, seed: u64) -> Self {
        Self::with_backend(hw, Box::new(CpuStateBackend::new()), seed)
    }

    /// Create an engine over an explicit backend with a fixed seed.
    pub fn with_backend(hw: HardwareConfig, backend: Box<dyn StateBackend>, seed: u64) -> Self {
        Self {
            state: StatevectorState::new(hw),
            noise: None,
            rng: Mt19937GenRand64::seed_from_u64(seed),
            backend,
            progress: None,
        }
    }

    /// Attach a noise model, or detach with `None`.
    ///
    /// The engine stores a fresh [`NoiseEngine::clone_box`] copy so that
    /// per-shot channel state (loss tracking) is owned by this engine and
    /// never shared across shots.
    pub fn set_noise_model(&mut self, noise: Option<&dyn NoiseEngine>) {
        self.noise = noise.map(NoiseEngine::clone_box);
    }

    /// Reseed the stochastic processes (measurement sampling, noise).
    pub fn set_random_seed(&mut self, seed: u64) {
        self.rng = Mt19937GenRand64::seed_from_u64(seed);
    }

    /// Set the shot index stamped on log events.
    pub fn set_shot_index(&mut self, shot: usize) {
        self.state.shot_index = shot;
    }

    /// Attach a progress reporter; the engine bumps it once per instruction.
    pub fn set_progress_reporter(&mut self, reporter: Arc<dyn ProgressReporter>) {
        self.progress = Some(reporter);
    }

    /// Execute a straight-line program.
    ///
    /// Clears the log buffer, then dispatches each instruction in order.
    /// The first error aborts the run; the shot's partial state remains
    /// readable for diagnostics.
    pub fn run(&mut self, program: &[Instruction]) -> VmResult<()> {
        self.state.logs.clear();
        for instr in program {
            match instr {
                Instruction::AllocArray { n_qubits } => self.alloc_array(*n_qubits)?,
                Instruction::ApplyGate(gate) => self.apply_gate(gate)?,
                Instruction::Measure { targets } => self.measure(targets)?,
                Instruction::MoveAtom { atom, position } => self.move_atom(*atom, *position)?,
                Instruction::Wait { duration_ns } => self.wait(*duration_ns)?,
                Instruction::Pulse {
                    target,
                    detuning,
                    duration_ns,
                } => self.pulse(*target, *detuning, *duration_ns)?,
            }
            if let Some(reporter) = &self.progress {
                reporter.increment_completed_steps(1);
            }
        }
        Ok(())
    }

    /// The amplitude vector.
    pub fn state_vector(&self) -> &[Complex64] {
        self.backend.state()
    }

    /// The classical side-state of the shot.
    pub fn state(&self) -> &StatevectorState {
        &self.state
    }

    /// Log events emitted by the last `run`.
    pub fn logs(&self) -> &[ExecutionLog] {
        &self.state.logs
    }

    fn log_event(&mut self, category: LogCategory, message: String) {
        let log = ExecutionLog {
            shot: self.state.shot_index,
            time: self.state.logical_time,
            category,
            message,
        };
        if let Some(reporter) = &self.progress {
            reporter.record_log(&log);
        }
        self.state.logs.push(log);
    }

    fn require_allocated(&self, what: &str) -> VmResult<()> {
        if self.state.n_qubits == 0 {
            return Err(VmError::InvalidSequence(format!(
                "{what} before AllocArray"
            )));
        }
        Ok(())
    }

    fn check_target(&self, q: usize, what: &str) -> VmResult<()> {
        if q >= self.state.n_qubits {
            return Err(VmError::OutOfRange(format!(
                "{what} target {q} outside [0, {})",
                self.state.n_qubits
            )));
        }
        Ok(())
    }

    fn alloc_array(&mut self, n: usize) -> VmResult<()> {
        self.backend.alloc_array(n)?;
        self.state.n_qubits = self.backend.num_qubits();
        if self.state.hw.positions.len() < n {
            self.state.hw.positions.resize(n, 0.0);
        }
        self.state.logical_time = 0.0;
        self.state.last_measurement_time = vec![f64::NEG_INFINITY; n];
        self.backend.sync_host_to_device();
        debug!(n_qubits = n, "allocated qubit array");
        self.log_event(LogCategory::AllocArray, format!("AllocArray n_qubits={n}"));
        Ok(())
    }

    fn enforce_measurement_cooldown(&mut self, gate: &Gate) -> VmResult<()> {
        let cooldown = self.state.hw.timing_limits.measurement_cooldown_ns;
        if cooldown <= 0.0 {
            return Ok(());
        }
        for &target in &gate.targets {
            let last = self
                .state
                .last_measurement_time
                .get(target)
                .copied()
                .unwrap_or(f64::NEG_INFINITY);
            if self.state.logical_time - last < cooldown {
                let message = format!(
                    "{} on qubit {target} within {cooldown}ns measurement cooldown",
                    gate.name
                );
                self.log_event(LogCategory::TimingConstraint, message.clone());
                return Err(VmError::TimingViolation(message));
            }
        }
        Ok(())
    }

    fn enforce_native_gate(&self, gate: &Gate) -> VmResult<Option<&NativeGate>> {
        if self.state.hw.native_gates.is_empty() {
            return Ok(None);
        }
        let native = self
            .state
            .hw
            .find_native_gate(&gate.name, gate.arity())
            .ok_or_else(|| {
                VmError::UnsupportedGate(format!(
                    "{} (arity {}) is not in the native gate catalog",
                    gate.name,
                    gate.arity()
                ))
            })?;

        if native.angle_max > native.angle_min
            && !(native.angle_min..=native.angle_max).contains(&gate.param)
        {
            return Err(VmError::InvalidArgument(format!(
                "{} parameter {} outside [{}, {}]",
                gate.name, gate.param, native.angle_min, native.angle_max
            )));
        }

        if gate.arity() >= 2 {
            self.enforce_connectivity(gate, native)?;
        }
        Ok(Some(native))
    }

    fn enforce_connectivity(&self, gate: &Gate, native: &NativeGate) -> VmResult<()> {
        match native.connectivity {
            ConnectivityKind::AllToAll => Ok(()),
            ConnectivityKind::NearestNeighborChain => {
                for pair in gate.targets.windows(2) {
                    let (a, b) = (pair[0] as isize, pair[1] as isize);
                    if (a - b).abs() != 1 {
                        return Err(VmError::ConnectivityViolation(format!(
                            "{} on qubits {a} and {b} requires a nearest-neighbor chain",
                            gate.name
                        )));
                    }
                }
                Ok(())
            }
            ConnectivityKind::NearestNeighborGrid => {
                for pair in gate.targets.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    let sa = self.state.hw.site_for_slot(&self.state.site_index, a);
                    let sb = self.state.hw.site_for_slot(&self.state.site_index, b);
                    let (sa, sb) = match (sa, sb) {
                        (Some(sa), Some(sb)) => (sa, sb),
                        _ => {
                            return Err(VmError::ConnectivityViolation(format!(
                                "{} on qubits {a} and {b} requires grid site descriptors",
                                gate.name
                            )))
                        }
                    };
                    let manhattan = (sa.x - sb.x).abs() + (sa.y - sb.y).abs();
                    if (manhattan - 1.0).abs() > GRID_DISTANCE_EPSILON {
                        return Err(VmError::ConnectivityViolation(format!(
                            "{} on qubits {a} and {b} requires nearest-neighbor grid sites",
                            gate.name
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    fn enforce_blockade(&self, gate: &Gate, q0: usize, q1: usize) -> VmResult<()> {
        if let Some(reason) =
            blockade_violation_reason(&self.state.hw, &self.state.site_index, q0, q1)
        {
            return Err(VmError::BlockadeViolation(format!(
                "{} between qubits {q0} and {q1} violates {reason}",
                gate.name
            )));
        }
        Ok(())
    }

    fn apply_gate(&mut self, gate: &Gate) -> VmResult<()> {
        self.require_allocated("ApplyGate")?;
        for &target in &gate.targets {
            self.check_target(target, &gate.name)?;
        }

        self.enforce_measurement_cooldown(gate)?;
        self.enforce_native_gate(gate)?;

        match (gate.name.as_str(), gate.targets.as_slice()) {
            ("X", &[t]) => self.backend.apply_single_qubit_unitary(t, &pauli_x())?,
            ("H", &[t]) => self.backend.apply_single_qubit_unitary(t, &hadamard())?,
            ("Z", &[t]) => self.backend.apply_single_qubit_unitary(t, &pauli_z())?,
            ("CX", &[q0, q1]) => {
                self.enforce_blockade(gate, q0, q1)?;
                self.backend.apply_two_qubit_unitary(q0, q1, &controlled_x())?;
            }
            ("CZ", &[q0, q1]) => {
                self.enforce_blockade(gate, q0, q1)?;
                self.backend.apply_two_qubit_unitary(q0, q1, &controlled_z())?;
            }
            _ => {
                return Err(VmError::UnsupportedGate(format!(
                    "{} with {} targets",
                    gate.name,
                    gate.arity()
                )))
            }
        }
        self.backend.sync_device_to_host();

        if let Some(noise) = self.noise.as_deref_mut() {
            let mut stream = PrngStream::new(&mut self.rng);
            match gate.targets.as_slice() {
                &[t] => noise.apply_single_qubit_gate_noise(
                    t,
                    self.state.n_qubits,
                    self.backend.state_mut(),
                    &mut stream,
                ),
                &[q0, q1] => noise.apply_two_qubit_gate_noise(
                    q0,
                    q1,
                    self.state.n_qubits,
                    self.backend.state_mut(),
                    &mut stream,
                ),
                _ => {}
            }
        }

        self.log_event(
            LogCategory::ApplyGate,
            format!(
                "{} targets={} param={}",
                gate.name,
                format_targets(&gate.targets),
                gate.param
            ),
        );
        Ok(())
    }

    fn measure(&mut self, targets: &[usize]) -> VmResult<()> {
        if targets.is_empty() {
            return Ok(());
        }
        self.require_allocated("Measure")?;
        for &target in targets {
            self.check_target(target, "Measure")?;
        }
        let mut seen = vec![false; self.state.n_qubits];
        for &target in targets {
            if seen[target] {
                return Err(VmError::InvalidArgument(format!(
                    "duplicate measurement target {target}"
                )));
            }
            seen[target] = true;
        }

        let k = targets.len();
        let combos = 1usize << k;
        let mut outcome_probs = vec![0.0_f64; combos];
        {
            let amps = self.backend.state();
            for (i, amp) in amps.iter().enumerate() {
                let p = amp.norm_sqr();
                if p == 0.0 {
                    continue;
                }
                outcome_probs[outcome_of_index(i, targets)] += p;
            }
        }

        let total: f64 = outcome_probs.iter().sum();
        if total == 0.0 {
            return Err(VmError::InvalidState(
                "state has zero norm before measurement".into(),
            ));
        }
        for p in &mut outcome_probs {
            *p /= total;
        }

        let dist = WeightedIndex::new(&outcome_probs).map_err(|_| {
            VmError::InvalidState("no measurement outcome has positive probability".into())
        })?;
        let selected = dist.sample(&mut self.rng);
        let selected_prob = outcome_probs[selected];
        if selected_prob == 0.0 {
            return Err(VmError::InvalidState(
                "sampled measurement outcome has zero probability".into(),
            ));
        }

        let norm = selected_prob.sqrt();
        {
            let amps = self.backend.state_mut();
            for (i, amp) in amps.iter_mut().enumerate() {
                if outcome_of_index(i, targets) == selected {
                    *amp /= norm;
                } else {
                    *amp = Complex64::new(0.0, 0.0);
                }
            }
        }

        let bits: Vec<i8> = (0..k).map(|idx| ((selected >> idx) & 1) as i8).collect();
        let mut record = MeasurementRecord::new(targets.to_vec(), bits);

        if let Some(noise) = self.noise.as_deref_mut() {
            let before = record.bits.clone();
            let mut stream = PrngStream::new(&mut self.rng);
            noise.apply_measurement_noise(&mut record, &mut stream);
            for (idx, (&was, &now)) in before.iter().zip(record.bits.iter()).enumerate() {
                if was == now {
                    continue;
                }
                let qubit = record.targets[idx];
                let message = if now == -1 {
                    format!("atom loss on qubit {qubit}")
                } else {
                    format!("readout flip on qubit {qubit}: {was} -> {now}")
                };
                self.log_event(LogCategory::Noise, message);
            }
        }

        let message = format!(
            "Measure targets={} bits={}",
            format_targets(&record.targets),
            format_bits(&record.bits)
        );
        self.state.measurements.push(record);
        for &target in targets {
            self.state.last_measurement_time[target] = self.state.logical_time;
        }
        self.backend.sync_host_to_device();
        self.log_event(LogCategory::Measure, message);
        Ok(())
    }

    fn move_atom(&mut self, atom: usize, position: f64) -> VmResult<()> {
        self.require_allocated("MoveAtom")?;
        self.check_target(atom, "MoveAtom")?;
        self.state.hw.positions[atom] = position;
        self.log_event(
            LogCategory::MoveAtom,
            format!("MoveAtom atom={atom} position={position}"),
        );
        Ok(())
    }

    fn wait(&mut self, duration_ns: f64) -> VmResult<()> {
        self.require_allocated("Wait")?;
        if duration_ns < 0.0 {
            return Err(VmError::InvalidArgument(
                "Wait duration must be non-negative".into(),
            ));
        }
        let limits = self.state.hw.timing_limits;
        if limits.min_wait_ns > 0.0 && duration_ns < limits.min_wait_ns {
            let message = format!(
                "Wait {duration_ns}ns below configured minimum {}ns",
                limits.min_wait_ns
            );
            self.log_event(LogCategory::TimingConstraint, message.clone());
            return Err(VmError::TimingViolation(message));
        }
        if limits.max_wait_ns > 0.0 && duration_ns > limits.max_wait_ns {
            let message = format!(
                "Wait {duration_ns}ns above configured maximum {}ns",
                limits.max_wait_ns
            );
            self.log_event(LogCategory::TimingConstraint, message.clone());
            return Err(VmError::TimingViolation(message));
        }

        self.state.logical_time += duration_ns;
        if let Some(noise) = self.noise.as_deref_mut() {
            let mut stream = PrngStream::new(&mut self.rng);
            noise.apply_idle_noise(
                self.state.n_qubits,
                self.backend.state_mut(),
                duration_ns,
                &mut stream,
            );
        }
        self.log_event(LogCategory::Wait, format!("Wait duration_ns={duration_ns}"));
        Ok(())
    }

    fn pulse(&mut self, target: usize, detuning: f64, duration_ns: f64) -> VmResult<()> {
        self.require_allocated("Pulse")?;
        self.check_target(target, "Pulse")?;
        if duration_ns < 0.0 {
            return Err(VmError::InvalidArgument(
                "Pulse duration must be non-negative".into(),
            ));
        }
        let limits = self.state.hw.pulse_limits;
        if limits.detuning_max > limits.detuning_min
            && !(limits.detuning_min..=limits.detuning_max).contains(&detuning)
        {
            let message = format!(
                "Pulse detuning {detuning} outside [{}, {}]",
                limits.detuning_min, limits.detuning_max
            );
            self.log_event(LogCategory::TimingConstraint, message.clone());
            return Err(VmError::TimingViolation(message));
        }
        if limits.duration_min_ns > 0.0 && duration_ns < limits.duration_min_ns {
            let message = format!(
                "Pulse {duration_ns}ns below configured minimum {}ns",
                limits.duration_min_ns
            );
            self.log_event(LogCategory::TimingConstraint, message.clone());
            return Err(VmError::TimingViolation(message));
        }
        if limits.duration_max_ns > 0.0 && duration_ns > limits.duration_max_ns {
            let message = format!(
                "Pulse {duration_ns}ns above configured maximum {}ns",
                limits.duration_max_ns
            );
            self.log_event(LogCategory::TimingConstraint, message.clone());
            return Err(VmError::TimingViolation(message));
        }

        self.state.pulse_log.push(PulseEvent {
            target,
            detuning,
            duration_ns,
        });
        self.log_event(
            LogCategory::Pulse,
            format!("Pulse target={target} detuning={detuning} duration_ns={duration_ns}"),
        );
        Ok(())
    }
}

fn outcome_of_index(index: usize, targets: &[usize]) -> usize {
    let mut outcome = 0usize;
    for (idx, &target) in targets.iter().enumerate() {
        outcome |= ((index >> target) & 1) << idx;
    }
    outcome
}

fn format_targets(targets: &[usize]) -> String {
    let inner = targets
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("[{inner}]")
}

fn format_bits(bits: &[i8]) -> String {
    let inner = bits
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("[{inner}]")
}

fn pauli_x() -> [Complex64; 4] {
    let o = Complex64::new(0.0, 0.0);
    let l = Complex64::new(1.0, 0.0);
    [o, l, l, o]
}

fn pauli_z() -> [Complex64; 4] {
    let o = Complex64::new(0.0, 0.0);
    let l = Complex64::new(1.0, 0.0);
    [l, o, o, -l]
}

fn hadamard() -> [Complex64; 4] {
    let h = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
    [h, h, h, -h]
}

fn controlled_x() -> [Complex64; 16] {
    let o = Complex64::new(0.0, 0.0);
    let l = Complex64::new(1.0, 0.0);
    [
        l, o, o, o, //
        o, l, o, o, //
        o, o, o, l, //
        o, o, l, o, //
    ]
}

fn controlled_z() -> [Complex64; 16] {
    let o = Complex64::new(0.0, 0.0);
    let l = Complex64::new(1.0, 0.0);
    [
        l, o, o, o, //
        o, l, o, o, //
        o, o, l, o, //
        o, o, o, -l, //
    ]
}
