//! Accumulating random phase drift during idle windows.

use num_complex::Complex64;

use crate::engine::NoiseEngine;
use crate::pauli::{apply_phase_rotation, sample_phase_angle};
use crate::stream::RandomStream;

/// Per-qubit phase rotation with `θ ~ U(-rate·duration, +rate·duration)`,
/// so longer waits accumulate proportionally larger drifts.
#[derive(Debug, Clone)]
pub struct IdlePhaseDriftSource {
    rate: f64,
}

impl IdlePhaseDriftSource {
    /// Create the channel from a per-nanosecond drift magnitude.
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl NoiseEngine for IdlePhaseDriftSource {
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
        if self.rate <= 0.0 || duration_ns <= 0.0 {
            return;
        }
        let magnitude = self.rate * duration_ns;
        for q in 0..n_qubits {
            let theta = sample_phase_angle(magnitude, rng);
            apply_phase_rotation(amplitudes, q, theta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStream;

    #[test]
    fn test_drift_scales_with_duration() {
        let mut source = IdlePhaseDriftSource::new(0.01);
        let mut amps = vec![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)];
        // Unit draw 1.0 gives theta = rate * duration.
        let mut stream = ScriptedStream::new([1.0]);
        source.apply_idle_noise(1, &mut amps, 50.0, &mut stream);
        let theta = 0.01 * 50.0;
        let expected1 = Complex64::from_polar(1.0, theta / 2.0);
        assert!((amps[1] - expected1).norm() < 1e-12);
    }

    #[test]
    fn test_each_qubit_draws_fresh() {
        let mut source = IdlePhaseDriftSource::new(1.0);
        let mut amps = vec![Complex64::new(0.5, 0.0); 4];
        let mut stream = ScriptedStream::new([0.5, 0.25]);
        source.apply_idle_noise(2, &mut amps, 1.0, &mut stream);
        assert_eq!(stream.draws(), 2);
    }
}
