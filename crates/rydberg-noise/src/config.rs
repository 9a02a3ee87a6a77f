//! Noise configuration and the standard pipeline builder.

use serde::{Deserialize, Serialize};

use rydberg_isa::{VmError, VmResult};

use crate::engine::{CompositeNoiseEngine, NoiseEngine};
use crate::sources::{
    AmplitudeDampingSource, CorrelatedPauliSource, IdleDephasingSource, IdlePhaseDriftSource,
    LossTrackingSource, MeasurementNoiseSource, PhaseKickSource, SingleQubitPauliSource,
    TwoQubitPauliSource,
};

const PROB_EPSILON: f64 = 1e-12;

/// Classical readout noise on measurement outcomes, per bit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementNoiseConfig {
    /// Probability of reading a 0 as a 1.
    #[serde(default)]
    pub p_flip0_to_1: f64,
    /// Probability of reading a 1 as a 0.
    #[serde(default)]
    pub p_flip1_to_0: f64,
}

/// Per-qubit Pauli error probabilities; identity fills the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SingleQubitPauliConfig {
    /// Probability of an X error.
    #[serde(default)]
    pub px: f64,
    /// Probability of a Y error.
    #[serde(default)]
    pub py: f64,
    /// Probability of a Z error.
    #[serde(default)]
    pub pz: f64,
}

impl SingleQubitPauliConfig {
    /// Total error mass `px + py + pz`.
    pub fn total(&self) -> f64 {
        self.px + self.py + self.pz
    }
}

/// Gate-level Pauli channels, global per gate class.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GateNoiseConfig {
    /// Channel on the target of single-qubit gates.
    #[serde(default)]
    pub single_qubit: SingleQubitPauliConfig,
    /// Channel on the control of two-qubit gates.
    #[serde(default)]
    pub two_qubit_control: SingleQubitPauliConfig,
    /// Channel on the target of two-qubit gates.
    #[serde(default)]
    pub two_qubit_target: SingleQubitPauliConfig,
}

/// Correlated two-qubit Pauli probabilities as a 4×4 control-major table in
/// the order I, X, Y, Z. Total mass must not exceed 1.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TwoQubitCorrelatedPauliConfig {
    /// Row-major joint probability table.
    #[serde(default)]
    pub matrix: [f64; 16],
}

impl TwoQubitCorrelatedPauliConfig {
    /// Total probability mass of the table.
    pub fn total(&self) -> f64 {
        self.matrix.iter().sum()
    }
}

/// Random Z-phase kick magnitudes, in radians.
///
/// Gate kicks draw from `[-magnitude, +magnitude]`; the idle term is a
/// per-nanosecond magnitude so longer waits drift further.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseNoiseConfig {
    /// Kick magnitude after single-qubit gates.
    #[serde(default)]
    pub single_qubit: f64,
    /// Kick magnitude on the control after two-qubit gates.
    #[serde(default)]
    pub two_qubit_control: f64,
    /// Kick magnitude on the target after two-qubit gates.
    #[serde(default)]
    pub two_qubit_target: f64,
    /// Drift magnitude per nanosecond of idle time.
    #[serde(default)]
    pub idle: f64,
}

/// Amplitude-damping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AmplitudeDampingConfig {
    /// Damping strength applied at each gate boundary, in `[0, 1]`.
    #[serde(default)]
    pub per_gate: f64,
    /// Idle damping rate per nanosecond.
    #[serde(default)]
    pub idle_rate: f64,
}

/// Runtime atom-loss probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LossRuntimeConfig {
    /// Loss probability per gate touch, in `[0, 1]`.
    #[serde(default)]
    pub per_gate: f64,
    /// Idle loss rate per nanosecond.
    #[serde(default)]
    pub idle_rate: f64,
}

/// Aggregated stochastic noise model for a device.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimpleNoiseConfig {
    /// Symmetric effective bit-flip probability at measurement, capturing
    /// upstream quantum errors that manifest in the measurement basis.
    #[serde(default)]
    pub p_quantum_flip: f64,
    /// Probability that a measured qubit is lost/erased (`-1` readout).
    #[serde(default)]
    pub p_loss: f64,
    /// Classical readout noise on top of the quantum and loss contributions.
    #[serde(default)]
    pub readout: MeasurementNoiseConfig,
    /// Pauli channels applied after gates.
    #[serde(default)]
    pub gate: GateNoiseConfig,
    /// Correlated two-qubit Pauli channel after entangling gates.
    #[serde(default)]
    pub correlated_gate: TwoQubitCorrelatedPauliConfig,
    /// Dephasing rate per nanosecond during idle windows.
    #[serde(default)]
    pub idle_rate: f64,
    /// Random Z-phase kicks around gates and idles.
    #[serde(default)]
    pub phase: PhaseNoiseConfig,
    /// Amplitude damping after gates and idle windows.
    #[serde(default)]
    pub amplitude_damping: AmplitudeDampingConfig,
    /// Runtime loss probabilities (per gate touch / per nanosecond idle).
    #[serde(default)]
    pub loss_runtime: LossRuntimeConfig,
}

fn check_probability(value: f64, what: &str) -> VmResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(VmError::InvalidConfig(format!(
            "{what} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

fn check_pauli(cfg: &SingleQubitPauliConfig, what: &str) -> VmResult<()> {
    check_probability(cfg.px, what)?;
    check_probability(cfg.py, what)?;
    check_probability(cfg.pz, what)?;
    if cfg.total() > 1.0 + PROB_EPSILON {
        return Err(VmError::InvalidConfig(format!(
            "{what}: px + py + pz must not exceed 1"
        )));
    }
    Ok(())
}

fn validate_config(config: &SimpleNoiseConfig) -> VmResult<()> {
    check_probability(config.p_quantum_flip, "p_quantum_flip")?;
    check_probability(config.p_loss, "p_loss")?;
    check_probability(config.readout.p_flip0_to_1, "readout.p_flip0_to_1")?;
    check_probability(config.readout.p_flip1_to_0, "readout.p_flip1_to_0")?;

    check_pauli(&config.gate.single_qubit, "gate.single_qubit")?;
    check_pauli(&config.gate.two_qubit_control, "gate.two_qubit_control")?;
    check_pauli(&config.gate.two_qubit_target, "gate.two_qubit_target")?;

    if config.phase.single_qubit < 0.0
        || config.phase.two_qubit_control < 0.0
        || config.phase.two_qubit_target < 0.0
        || config.phase.idle < 0.0
    {
        return Err(VmError::InvalidConfig(
            "phase noise magnitudes must be non-negative".into(),
        ));
    }

    for p in &config.correlated_gate.matrix {
        check_probability(*p, "correlated_gate entry")?;
    }
    if config.correlated_gate.total() > 1.0 + PROB_EPSILON {
        return Err(VmError::InvalidConfig(
            "sum of correlated Pauli probabilities must not exceed 1".into(),
        ));
    }

    if config.amplitude_damping.per_gate < 0.0
        || config.amplitude_damping.per_gate > 1.0 + PROB_EPSILON
        || config.amplitude_damping.idle_rate < 0.0
    {
        return Err(VmError::InvalidConfig(
            "amplitude damping must be non-negative and at most 1 per gate".into(),
        ));
    }

    if config.loss_runtime.per_gate < 0.0
        || config.loss_runtime.per_gate > 1.0 + PROB_EPSILON
        || config.loss_runtime.idle_rate < 0.0
    {
        return Err(VmError::InvalidConfig(
            "runtime loss must be non-negative and at most 1 per gate".into(),
        ));
    }

    Ok(())
}

fn build_sources(config: &SimpleNoiseConfig) -> Vec<Box<dyn NoiseEngine>> {
    let mut sources: Vec<Box<dyn NoiseEngine>> = Vec::new();

    let has_runtime_loss = config.p_loss > 0.0
        || config.loss_runtime.per_gate > 0.0
        || config.loss_runtime.idle_rate > 0.0;
    if has_runtime_loss {
        sources.push(Box::new(LossTrackingSource::new(
            config.p_loss,
            config.loss_runtime,
        )));
    }

    let has_measurement = config.p_quantum_flip > 0.0
        || config.readout.p_flip0_to_1 > 0.0
        || config.readout.p_flip1_to_0 > 0.0;
    if has_measurement {
        sources.push(Box::new(MeasurementNoiseSource::new(
            config.p_quantum_flip,
            config.readout,
        )));
    }

    if config.amplitude_damping.per_gate > 0.0 || config.amplitude_damping.idle_rate > 0.0 {
        sources.push(Box::new(AmplitudeDampingSource::new(
            config.amplitude_damping,
        )));
    }

    if config.gate.single_qubit.total() > 0.0 {
        sources.push(Box::new(SingleQubitPauliSource::new(
            config.gate.single_qubit,
        )));
    }

    if config.gate.two_qubit_control.total() > 0.0 || config.gate.two_qubit_target.total() > 0.0 {
        sources.push(Box::new(TwoQubitPauliSource::new(
            config.gate.two_qubit_control,
            config.gate.two_qubit_target,
        )));
    }

    if config.correlated_gate.total() > 0.0 {
        sources.push(Box::new(CorrelatedPauliSource::new(config.correlated_gate)));
    }

    let has_phase = config.phase.single_qubit > 0.0
        || config.phase.two_qubit_control > 0.0
        || config.phase.two_qubit_target > 0.0;
    if has_phase {
        sources.push(Box::new(PhaseKickSource::new(config.phase)));
    }

    if config.idle_rate > 0.0 {
        sources.push(Box::new(IdleDephasingSource::new(config.idle_rate)));
    }

    if config.phase.idle > 0.0 {
        sources.push(Box::new(IdlePhaseDriftSource::new(config.phase.idle)));
    }

    sources
}

/// The standard device noise engine: a validated [`SimpleNoiseConfig`]
/// realized as an ordered composition of the concrete channels.
///
/// Only channels with non-zero probability mass are instantiated, in the
/// fixed order documented at the crate root.
pub struct SimpleNoiseEngine {
    inner: CompositeNoiseEngine,
}

impl SimpleNoiseEngine {
    /// Validate the configuration and assemble the pipeline.
    pub fn new(config: &SimpleNoiseConfig) -> VmResult<Self> {
        validate_config(config)?;
        Ok(Self {
            inner: CompositeNoiseEngine::new(build_sources(config)),
        })
    }

    /// Number of active channels in the pipeline.
    pub fn source_count(&self) -> usize {
        self.inner.source_count()
    }
}

impl NoiseEngine for SimpleNoiseEngine {
    fn clone_box(&self) -> Box<dyn NoiseEngine> {
        self.inner.clone_box()
    }

    fn apply_measurement_noise(
        &mut self,
        record: &mut rydberg_isa::MeasurementRecord,
        rng: &mut dyn crate::stream::RandomStream,
    ) {
        self.inner.apply_measurement_noise(record, rng);
    }

    fn apply_single_qubit_gate_noise(
        &mut self,
        target: usize,
        n_qubits: usize,
        amplitudes: &mut [num_complex::Complex64],
        rng: &mut dyn crate::stream::RandomStream,
    ) {
        self.inner
            .apply_single_qubit_gate_noise(target, n_qubits, amplitudes, rng);
    }

    fn apply_two_qubit_gate_noise(
        &mut self,
        q0: usize,
        q1: usize,
        n_qubits: usize,
        amplitudes: &mut [num_complex::Complex64],
        rng: &mut dyn crate::stream::RandomStream,
    ) {
        self.inner
            .apply_two_qubit_gate_noise(q0, q1, n_qubits, amplitudes, rng);
    }

    fn apply_idle_noise(
        &mut self,
        n_qubits: usize,
        amplitudes: &mut [num_complex::Complex64],
        duration_ns: f64,
        rng: &mut dyn crate::stream::RandomStream,
    ) {
        self.inner
            .apply_idle_noise(n_qubits, amplitudes, duration_ns, rng);
    }
}
