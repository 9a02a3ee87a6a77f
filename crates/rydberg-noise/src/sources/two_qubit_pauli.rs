//! Independent Pauli errors on control and target of two-qubit gates.

use num_complex::Complex64;

use crate::config::SingleQubitPauliConfig;
use crate::engine::NoiseEngine;
use crate::pauli::{apply_pauli, sample_pauli};
use crate::stream::RandomStream;

/// Samples one Pauli for the control and one for the target, each from its
/// own configuration, with independent draws.
#[derive(Debug, Clone)]
pub struct TwoQubitPauliSource {
    control: SingleQubitPauliConfig,
    target: SingleQubitPauliConfig,
}

impl TwoQubitPauliSource {
    /// Create the channel from control/target configurations.
    pub fn new(control: SingleQubitPauliConfig, target: SingleQubitPauliConfig) -> Self {
        Self { control, target }
    }
}

impl NoiseEngine for TwoQubitPauliSource {
    fn clone_box(&self) -> Box<dyn NoiseEngine> {
        Box::new(self.clone())
    }

    fn apply_two_qubit_gate_noise(
        &mut self,
        q0: usize,
        q1: usize,
        _n_qubits: usize,
        amplitudes: &mut [Complex64],
        rng: &mut dyn RandomStream,
    ) {
        if self.control.total() > 0.0 {
            let pauli = sample_pauli(&self.control, rng);
            apply_pauli(pauli, amplitudes, q0);
        }
        if self.target.total() > 0.0 {
            let pauli = sample_pauli(&self.target, rng);
            apply_pauli(pauli, amplitudes, q1);
        }
    }
}
