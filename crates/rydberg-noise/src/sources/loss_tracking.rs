//! Atom-loss tracking across a shot.

use num_complex::Complex64;

use rydberg_isa::MeasurementRecord;

use crate::config::LossRuntimeConfig;
use crate::engine::NoiseEngine;
use crate::stream::RandomStream;

/// Tracks which atoms have been lost during the shot.
///
/// Every gate touch and idle window independently tests for loss; at
/// measurement, already-lost qubits read out `-1` and surviving qubits may
/// newly be lost with the measurement-loss probability. The `lost` bitmap is
/// per-shot state — the engine must own a fresh
/// [`clone_box`](NoiseEngine::clone_box) copy per shot, never a shared
/// instance.
#[derive(Debug, Clone)]
pub struct LossTrackingSource {
    measurement_loss: f64,
    cfg: LossRuntimeConfig,
    lost: Vec<bool>,
}

impl LossTrackingSource {
    /// Create the channel from the measurement-loss probability and the
    /// runtime loss configuration.
    pub fn new(measurement_loss: f64, cfg: LossRuntimeConfig) -> Self {
        Self {
            measurement_loss,
            cfg,
            lost: Vec::new(),
        }
    }

    fn ensure_len(&mut self, len: usize) {
        if self.lost.len() < len {
            self.lost.resize(len, false);
        }
    }

    fn maybe_mark_loss(&mut self, q: usize, probability: f64, rng: &mut dyn RandomStream) {
        self.ensure_len(q + 1);
        if self.lost[q] || probability <= 0.0 {
            return;
        }
        if rng.uniform(0.0, 1.0) < probability {
            self.lost[q] = true;
        }
    }
}

impl NoiseEngine for LossTrackingSource {
    fn clone_box(&self) -> Box<dyn NoiseEngine> {
        Box::new(self.clone())
    }

    fn apply_single_qubit_gate_noise(
        &mut self,
        target: usize,
        n_qubits: usize,
        _amplitudes: &mut [Complex64],
        rng: &mut dyn RandomStream,
    ) {
        self.ensure_len(n_qubits);
        self.maybe_mark_loss(target, self.cfg.per_gate, rng);
    }

    fn apply_two_qubit_gate_noise(
        &mut self,
        q0: usize,
        q1: usize,
        n_qubits: usize,
        _amplitudes: &mut [Complex64],
        rng: &mut dyn RandomStream,
    ) {
        self.ensure_len(n_qubits);
        self.maybe_mark_loss(q0, self.cfg.per_gate, rng);
        self.maybe_mark_loss(q1, self.cfg.per_gate, rng);
    }

    fn apply_idle_noise(
        &mut self,
        n_qubits: usize,
        _amplitudes: &mut [Complex64],
        duration_ns: f64,
        rng: &mut dyn RandomStream,
    ) {
        self.ensure_len(n_qubits);
        if self.cfg.idle_rate <= 0.0 || duration_ns <= 0.0 {
            return;
        }
        let probability = 1.0 - (-self.cfg.idle_rate * duration_ns).exp();
        for q in 0..n_qubits {
            self.maybe_mark_loss(q, probability, rng);
        }
    }

    fn apply_measurement_noise(
        &mut self,
        record: &mut MeasurementRecord,
        rng: &mut dyn RandomStream,
    ) {
        for idx in 0..record.targets.len() {
            let q = record.targets[idx];
            self.ensure_len(q + 1);
            if self.lost[q] {
                record.bits[idx] = -1;
                continue;
            }
            if self.measurement_loss > 0.0 && rng.uniform(0.0, 1.0) < self.measurement_loss {
                self.lost[q] = true;
                record.bits[idx] = -1;
            }
        }
    }
}
