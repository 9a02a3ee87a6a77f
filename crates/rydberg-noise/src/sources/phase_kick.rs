//! Random Z-phase kicks around gates.

use num_complex::Complex64;

use crate::config::PhaseNoiseConfig;
use crate::engine::NoiseEngine;
use crate::pauli::{apply_phase_rotation, sample_phase_angle};
use crate::stream::RandomStream;

/// Applies `diag(e^{-iθ/2}, e^{+iθ/2})` with `θ ~ U(-M, +M)` after gates,
/// with separate magnitudes for single-qubit targets and the control/target
/// of two-qubit gates.
#[derive(Debug, Clone)]
pub struct PhaseKickSource {
    cfg: PhaseNoiseConfig,
}

impl PhaseKickSource {
    /// Create the channel from phase magnitudes.
    pub fn new(cfg: PhaseNoiseConfig) -> Self {
        Self { cfg }
    }

    fn kick(
        magnitude: f64,
        target: usize,
        amplitudes: &mut [Complex64],
        rng: &mut dyn RandomStream,
    ) {
        if magnitude <= 0.0 {
            return;
        }
        let theta = sample_phase_angle(magnitude, rng);
        apply_phase_rotation(amplitudes, target, theta);
    }
}

impl NoiseEngine for PhaseKickSource {
    fn clone_box(&self) -> Box<dyn NoiseEngine> {
        Box::new(self.clone())
    }

    fn apply_single_qubit_gate_noise(
        &mut self,
        target: usize,
        _n_qubits: usize,
        amplitudes: &mut [Complex64],
        rng: &mut dyn RandomStream,
    ) {
        Self::kick(self.cfg.single_qubit, target, amplitudes, rng);
    }

    fn apply_two_qubit_gate_noise(
        &mut self,
        q0: usize,
        q1: usize,
        _n_qubits: usize,
        amplitudes: &mut [Complex64],
        rng: &mut dyn RandomStream,
    ) {
        Self::kick(self.cfg.two_qubit_control, q0, amplitudes, rng);
        Self::kick(self.cfg.two_qubit_target, q1, amplitudes, rng);
    }
}
