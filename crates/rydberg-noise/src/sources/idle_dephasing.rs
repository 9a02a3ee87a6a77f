//! Bernoulli Z-dephasing during idle windows.

use num_complex::Complex64;

use crate::engine::NoiseEngine;
use crate::pauli::apply_pauli_z;
use crate::stream::RandomStream;

/// Per-qubit independent dephasing with probability
/// `1 - exp(-rate · duration)` per idle window.
#[derive(Debug, Clone)]
pub struct IdleDephasingSource {
    idle_rate: f64,
}

impl IdleDephasingSource {
    /// Create the channel from a per-nanosecond dephasing rate.
    pub fn new(idle_rate: f64) -> Self {
        Self { idle_rate }
    }
}

impl NoiseEngine for IdleDephasingSource {
    fn clone_box(&self) -> Box<dyn NoiseEngine> {
        Box::new(self.clone())
    }

    fn apply_idle_noise(
        &mut self,
        n_qubits: usize,
        amplitudes: &mut [Complex64],
        duration_ns: f64,
        rng: &mut dyn RandomStream,
    ) {
        if self.idle_rate <= 0.0 || duration_ns <= 0.0 {
            return;
        }
        let probability = 1.0 - (-self.idle_rate * duration_ns).exp();
        if probability <= 0.0 {
            return;
        }
        for q in 0..n_qubits {
            if rng.uniform(0.0, 1.0) < probability {
                apply_pauli_z(amplitudes, q);
            }
        }
    }
}
