//! Deterministic amplitude-damping contraction.

use num_complex::Complex64;

use crate::config::AmplitudeDampingConfig;
use crate::engine::NoiseEngine;
use crate::stream::RandomStream;

/// Applies the Kraus contraction
/// `a_i ← a_i + √γ·a_j`, `a_j ← √(1−γ)·a_j` for every index pair
/// `(i, j = i | 1<<q)` on the touched qubits, with `γ = per_gate` at gate
/// boundaries and `γ = 1 − exp(−idle_rate·duration)` on idle windows.
///
/// The contraction is deterministic; it deliberately leaks norm the way a
/// damping channel collapses the excited population.
#[derive(Debug, Clone)]
pub struct AmplitudeDampingSource {
    cfg: AmplitudeDampingConfig,
}

impl AmplitudeDampingSource {
    /// Create the channel from damping parameters.
    pub fn new(cfg: AmplitudeDampingConfig) -> Self {
        Self { cfg }
    }

    fn damp_qubit(amplitudes: &mut [Complex64], target: usize, gamma: f64) {
        if gamma <= 0.0 || amplitudes.is_empty() {
            return;
        }
        let mask = 1usize << target;
        let sqrt_gamma = gamma.clamp(0.0, 1.0).sqrt();
        let sqrt_keep = (1.0 - gamma).max(0.0).sqrt();
        for i in 0..amplitudes.len() {
            if i & mask != 0 {
                continue;
            }
            let j = i | mask;
            if j >= amplitudes.len() {
                continue;
            }
            let a0 = amplitudes[i];
            let a1 = amplitudes[j];
            amplitudes[i] = a0 + sqrt_gamma * a1;
            amplitudes[j] = sqrt_keep * a1;
        }
    }

    fn idle_gamma(&self, duration_ns: f64) -> f64 {
        (1.0 - (-self.cfg.idle_rate * duration_ns).exp()).clamp(0.0, 1.0)
    }
}

impl NoiseEngine for AmplitudeDampingSource {
    fn clone_box(&self) -> Box<dyn NoiseEngine> {
        Box::new(self.clone())
    }

    fn apply_single_qubit_gate_noise(
        &mut self,
        target: usize,
        _n_qubits: usize,
        amplitudes: &mut [Complex64],
        _rng: &mut dyn RandomStream,
    ) {
        if self.cfg.per_gate > 0.0 {
            Self::damp_qubit(amplitudes, target, self.cfg.per_gate.clamp(0.0, 1.0));
        }
    }

    fn apply_two_qubit_gate_noise(
        &mut self,
        q0: usize,
        q1: usize,
        _n_qubits: usize,
        amplitudes: &mut [Complex64],
        _rng: &mut dyn RandomStream,
    ) {
        if self.cfg.per_gate > 0.0 {
            let gamma = self.cfg.per_gate.clamp(0.0, 1.0);
            Self::damp_qubit(amplitudes, q0, gamma);
            Self::damp_qubit(amplitudes, q1, gamma);
        }
    }

    fn apply_idle_noise(
        &mut self,
        n_qubits: usize,
        amplitudes: &mut [Complex64],
        duration_ns: f64,
        _rng: &mut dyn RandomStream,
    ) {
        if self.cfg.idle_rate <= 0.0 || duration_ns <= 0.0 {
            return;
        }
        let gamma = self.idle_gamma(duration_ns);
        if gamma <= 0.0 {
            return;
        }
        for target in 0..n_qubits {
            Self::damp_qubit(amplitudes, target, gamma);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStream;

    #[test]
    fn test_full_damping_collapses_excited_state() {
        let mut source = AmplitudeDampingSource::new(AmplitudeDampingConfig {
            per_gate: 1.0,
            idle_rate: 0.0,
        });
        let mut amps = vec![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)];
        let mut stream = ScriptedStream::new([0.0]);
        source.apply_single_qubit_gate_noise(0, 1, &mut amps, &mut stream);
        assert!((amps[0] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        assert!(amps[1].norm() < 1e-12);
        // Deterministic channel: no randomness consumed.
        assert_eq!(stream.draws(), 0);
    }

    #[test]
    fn test_partial_damping_mixes_amplitudes() {
        let gamma: f64 = 0.36;
        let mut source = AmplitudeDampingSource::new(AmplitudeDampingConfig {
            per_gate: gamma,
            idle_rate: 0.0,
        });
        let mut amps = vec![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)];
        let mut stream = ScriptedStream::new([0.0]);
        source.apply_single_qubit_gate_noise(0, 1, &mut amps, &mut stream);
        assert!((amps[0].re - gamma.sqrt()).abs() < 1e-12);
        assert!((amps[1].re - (1.0 - gamma).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_two_qubit_gate_damps_both_qubits() {
        let mut source = AmplitudeDampingSource::new(AmplitudeDampingConfig {
            per_gate: 1.0,
            idle_rate: 0.0,
        });
        // |11> of two qubits.
        let mut amps = vec![Complex64::new(0.0, 0.0); 4];
        amps[3] = Complex64::new(1.0, 0.0);
        let mut stream = ScriptedStream::new([0.0]);
        source.apply_two_qubit_gate_noise(0, 1, 2, &mut amps, &mut stream);
        assert!((amps[0] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_idle_gamma_saturates() {
        let source = AmplitudeDampingSource::new(AmplitudeDampingConfig {
            per_gate: 0.0,
            idle_rate: 10.0,
        });
        assert!(source.idle_gamma(1e9) <= 1.0);
        assert!(source.idle_gamma(0.0) == 0.0);
    }
}
