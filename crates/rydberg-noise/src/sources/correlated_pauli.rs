//! Correlated two-qubit Pauli channel.

use num_complex::Complex64;

use crate::config::TwoQubitCorrelatedPauliConfig;
use crate::engine::NoiseEngine;
use crate::pauli::{apply_pauli, Pauli};
use crate::stream::RandomStream;

const PAULIS: [Pauli; 4] = [Pauli::I, Pauli::X, Pauli::Y, Pauli::Z];

/// Samples a joint Pauli pair from a 4×4 control-major probability table
/// (order I, X, Y, Z) and applies the pair to control and target.
#[derive(Debug, Clone)]
pub struct CorrelatedPauliSource {
    cfg: TwoQubitCorrelatedPauliConfig,
}

impl CorrelatedPauliSource {
    /// Create the channel from a joint probability table.
    pub fn new(cfg: TwoQubitCorrelatedPauliConfig) -> Self {
        Self { cfg }
    }
}

impl NoiseEngine for CorrelatedPauliSource {
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
        if self.cfg.total() <= 0.0 {
            return;
        }
        let r = rng.uniform(0.0, 1.0);
        let mut cumulative = 0.0;
        for (ctrl_idx, ctrl) in PAULIS.iter().enumerate() {
            for (tgt_idx, tgt) in PAULIS.iter().enumerate() {
                let p = self.cfg.matrix[4 * ctrl_idx + tgt_idx];
                if p <= 0.0 {
                    continue;
                }
                cumulative += p;
                if r < cumulative {
                    apply_pauli(*ctrl, amplitudes, q0);
                    apply_pauli(*tgt, amplitudes, q1);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStream;

    #[test]
    fn test_certain_xx_entry() {
        let mut cfg = TwoQubitCorrelatedPauliConfig::default();
        cfg.matrix[4 * 1 + 1] = 1.0; // (X, X)
        let mut source = CorrelatedPauliSource::new(cfg);
        let mut amps = vec![Complex64::new(0.0, 0.0); 4];
        amps[0] = Complex64::new(1.0, 0.0);
        let mut stream = ScriptedStream::new([0.5]);
        source.apply_two_qubit_gate_noise(0, 1, 2, &mut amps, &mut stream);
        assert_eq!(amps[3], Complex64::new(1.0, 0.0));
        assert_eq!(stream.draws(), 1);
    }

    #[test]
    fn test_residual_mass_is_identity() {
        let mut cfg = TwoQubitCorrelatedPauliConfig::default();
        cfg.matrix[4 * 1 + 1] = 0.3;
        let mut source = CorrelatedPauliSource::new(cfg);
        let mut amps = vec![Complex64::new(0.0, 0.0); 4];
        amps[0] = Complex64::new(1.0, 0.0);
        // Sample lands past the table's total mass: no Pauli applied.
        let mut stream = ScriptedStream::new([0.9]);
        source.apply_two_qubit_gate_noise(0, 1, 2, &mut amps, &mut stream);
        assert_eq!(amps[0], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_selects_entry_by_cumulative_mass() {
        let mut cfg = TwoQubitCorrelatedPauliConfig::default();
        cfg.matrix[4 * 0 + 1] = 0.25; // (I, X)
        cfg.matrix[4 * 3 + 0] = 0.25; // (Z, I)
        let mut source = CorrelatedPauliSource::new(cfg);
        let mut amps = vec![Complex64::new(0.0, 0.0); 4];
        amps[0] = Complex64::new(1.0, 0.0);
        // 0.3 falls in the second entry: Z on control, I on target.
        let mut stream = ScriptedStream::new([0.3]);
        source.apply_two_qubit_gate_noise(0, 1, 2, &mut amps, &mut stream);
        // Z on |0> is identity up to nothing: state unchanged.
        assert_eq!(amps[0], Complex64::new(1.0, 0.0));
        assert_eq!(stream.draws(), 1);
    }
}
