//! The noise-engine capability set and ordered composition.

use num_complex::Complex64;

use rydberg_isa::MeasurementRecord;

use crate::stream::RandomStream;

/// A stochastic channel hooked into shot execution.
///
/// All hooks default to no-ops so channels only implement the boundaries
/// they care about. Hooks take `&mut self`: loss tracking mutates per-shot
/// state, which is also why every shot receives its own
/// [`clone_box`](NoiseEngine::clone_box) copy rather than a shared
/// reference.
pub trait NoiseEngine: Send + Sync {
    /// Produce an independently owned copy of this channel.
    fn clone_box(&self) -> Box<dyn NoiseEngine>;

    /// Perturb a freshly sampled measurement record.
    fn apply_measurement_noise(
        &mut self,
        _record: &mut MeasurementRecord,
        _rng: &mut dyn RandomStream,
    ) {
    }

    /// Perturb amplitudes after a single-qubit gate on `target`.
    fn apply_single_qubit_gate_noise(
        &mut self,
        _target: usize,
        _n_qubits: usize,
        _amplitudes: &mut [Complex64],
        _rng: &mut dyn RandomStream,
    ) {
    }

    /// Perturb amplitudes after a two-qubit gate on `(q0, q1)`.
    fn apply_two_qubit_gate_noise(
        &mut self,
        _q0: usize,
        _q1: usize,
        _n_qubits: usize,
        _amplitudes: &mut [Complex64],
        _rng: &mut dyn RandomStream,
    ) {
    }

    /// Perturb amplitudes after an idle window of `duration_ns`.
    fn apply_idle_noise(
        &mut self,
        _n_qubits: usize,
        _amplitudes: &mut [Complex64],
        _duration_ns: f64,
        _rng: &mut dyn RandomStream,
    ) {
    }
}

impl Clone for Box<dyn NoiseEngine> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// An ordered sequence of channels driven as one engine.
///
/// Each hook visits the sources in insertion order; the ordering is part of
/// the contract because later channels observe the amplitudes earlier ones
/// produced.
#[derive(Default)]
pub struct CompositeNoiseEngine {
    sources: Vec<Box<dyn NoiseEngine>>,
}

impl CompositeNoiseEngine {
    /// Create a composite over the given sources.
    pub fn new(sources: Vec<Box<dyn NoiseEngine>>) -> Self {
        Self { sources }
    }

    /// Append a source to the pipeline.
    pub fn add_source(&mut self, source: Box<dyn NoiseEngine>) {
        self.sources.push(source);
    }

    /// Number of sources in the pipeline.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl NoiseEngine for CompositeNoiseEngine {
    fn clone_box(&self) -> Box<dyn NoiseEngine> {
        Box::new(CompositeNoiseEngine {
            sources: self.sources.clone(),
        })
    }

    fn apply_measurement_noise(
        &mut self,
        record: &mut MeasurementRecord,
        rng: &mut dyn RandomStream,
    ) {
        for source in &mut self.sources {
            source.apply_measurement_noise(record, rng);
        }
    }

    fn apply_single_qubit_gate_noise(
        &mut self,
        target: usize,
        n_qubits: usize,
        amplitudes: &mut [Complex64],
        rng: &mut dyn RandomStream,
    ) {
        for source in &mut self.sources {
            source.apply_single_qubit_gate_noise(target, n_qubits, amplitudes, rng);
        }
    }

    fn apply_two_qubit_gate_noise(
        &mut self,
        q0: usize,
        q1: usize,
        n_qubits: usize,
        amplitudes: &mut [Complex64],
        rng: &mut dyn RandomStream,
    ) {
        for source in &mut self.sources {
            source.apply_two_qubit_gate_noise(q0, q1, n_qubits, amplitudes, rng);
        }
    }

    fn apply_idle_noise(
        &mut self,
        n_qubits: usize,
        amplitudes: &mut [Complex64],
        duration_ns: f64,
        rng: &mut dyn RandomStream,
    ) {
        for source in &mut self.sources {
            source.apply_idle_noise(n_qubits, amplitudes, duration_ns, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStream;

    /// Tags amplitudes so ordering is observable: multiplies the ground
    /// amplitude by a fixed factor on every gate hook.
    struct ScaleSource {
        factor: f64,
    }

    impl NoiseEngine for ScaleSource {
        fn clone_box(&self) -> Box<dyn NoiseEngine> {
            Box::new(ScaleSource {
                factor: self.factor,
            })
        }

        fn apply_single_qubit_gate_noise(
            &mut self,
            _target: usize,
            _n_qubits: usize,
            amplitudes: &mut [Complex64],
            _rng: &mut dyn RandomStream,
        ) {
            amplitudes[0] += Complex64::new(self.factor, 0.0);
            amplitudes[0] *= Complex64::new(2.0, 0.0);
        }
    }

    #[test]
    fn test_sources_run_in_insertion_order() {
        let mut engine = CompositeNoiseEngine::default();
        engine.add_source(Box::new(ScaleSource { factor: 1.0 }));
        engine.add_source(Box::new(ScaleSource { factor: 10.0 }));

        let mut amps = vec![Complex64::new(0.0, 0.0); 2];
        let mut stream = ScriptedStream::new([0.0]);
        engine.apply_single_qubit_gate_noise(0, 1, &mut amps, &mut stream);
        // ((0 + 1) * 2 + 10) * 2 = 24; the reverse order would give 22.
        assert_eq!(amps[0], Complex64::new(24.0, 0.0));
    }

    #[test]
    fn test_clone_box_deep_clones_sources() {
        let mut engine = CompositeNoiseEngine::default();
        engine.add_source(Box::new(ScaleSource { factor: 1.0 }));
        let clone = engine.clone_box();
        drop(engine);
        // The clone still owns a working copy of every source.
        let mut clone = clone;
        let mut amps = vec![Complex64::new(0.0, 0.0); 2];
        let mut stream = ScriptedStream::new([0.0]);
        clone.apply_single_qubit_gate_noise(0, 1, &mut amps, &mut stream);
        assert_eq!(amps[0], Complex64::new(2.0, 0.0));
    }
}
