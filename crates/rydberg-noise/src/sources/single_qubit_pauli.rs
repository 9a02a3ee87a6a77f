//! Depolarizing-style Pauli errors after single-qubit gates.

use num_complex::Complex64;

use crate::config::SingleQubitPauliConfig;
use crate::engine::NoiseEngine;
use crate::pauli::{apply_pauli, sample_pauli};
use crate::stream::RandomStream;

/// Samples one Pauli per single-qubit gate and applies it to the gate
/// target.
#[derive(Debug, Clone)]
pub struct SingleQubitPauliSource {
    cfg: SingleQubitPauliConfig,
}

impl SingleQubitPauliSource {
    /// Create the channel from per-Pauli probabilities.
    pub fn new(cfg: SingleQubitPauliConfig) -> Self {
        Self { cfg }
    }
}

impl NoiseEngine for SingleQubitPauliSource {
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
        if self.cfg.total() <= 0.0 {
            return;
        }
        let pauli = sample_pauli(&self.cfg, rng);
        apply_pauli(pauli, amplitudes, target);
    }
}
