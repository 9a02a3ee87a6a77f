//! Classical measurement noise: quantum-flip plus asymmetric readout.

use rydberg_isa::MeasurementRecord;

use crate::config::MeasurementNoiseConfig;
use crate::engine::NoiseEngine;
use crate::stream::RandomStream;

/// Flips measured bits with a symmetric quantum-flip probability followed by
/// asymmetric readout probabilities. Lost bits (`-1`) pass through
/// untouched.
#[derive(Debug, Clone)]
pub struct MeasurementNoiseSource {
    p_quantum_flip: f64,
    readout: MeasurementNoiseConfig,
}

impl MeasurementNoiseSource {
    /// Create the channel from a flip probability and readout config.
    pub fn new(p_quantum_flip: f64, readout: MeasurementNoiseConfig) -> Self {
        Self {
            p_quantum_flip,
            readout,
        }
    }
}

impl NoiseEngine for MeasurementNoiseSource {
    fn clone_box(&self) -> Box<dyn NoiseEngine> {
        Box::new(self.clone())
    }

    fn apply_measurement_noise(
        &mut self,
        record: &mut MeasurementRecord,
        rng: &mut dyn RandomStream,
    ) {
        let has_quantum = self.p_quantum_flip > 0.0;
        let has_readout = self.readout.p_flip0_to_1 > 0.0 || self.readout.p_flip1_to_0 > 0.0;
        if !has_quantum && !has_readout {
            return;
        }

        for bit in &mut record.bits {
            if *bit == -1 {
                continue;
            }
            if has_quantum && rng.uniform(0.0, 1.0) < self.p_quantum_flip {
                *bit = 1 - *bit;
            }
            if has_readout {
                let r = rng.uniform(0.0, 1.0);
                if *bit == 0 && r < self.readout.p_flip0_to_1 {
                    *bit = 1;
                } else if *bit == 1 && r < self.readout.p_flip1_to_0 {
                    *bit = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStream;

    fn record(bits: Vec<i8>) -> MeasurementRecord {
        let targets = (0..bits.len()).collect();
        MeasurementRecord::new(targets, bits)
    }

    #[test]
    fn test_certain_readout_flip_zero_to_one() {
        let mut source = MeasurementNoiseSource::new(
            0.0,
            MeasurementNoiseConfig {
                p_flip0_to_1: 1.0,
                p_flip1_to_0: 0.0,
            },
        );
        let mut rec = record(vec![0, 1]);
        let mut stream = ScriptedStream::new([0.5]);
        source.apply_measurement_noise(&mut rec, &mut stream);
        assert_eq!(rec.bits, vec![1, 1]);
    }

    #[test]
    fn test_quantum_flip_precedes_readout() {
        // Quantum flip turns 0 into 1, then p_flip1_to_0 = 1 turns it back.
        let mut source = MeasurementNoiseSource::new(
            1.0,
            MeasurementNoiseConfig {
                p_flip0_to_1: 0.0,
                p_flip1_to_0: 1.0,
            },
        );
        let mut rec = record(vec![0]);
        let mut stream = ScriptedStream::new([0.0]);
        source.apply_measurement_noise(&mut rec, &mut stream);
        assert_eq!(rec.bits, vec![0]);
        assert_eq!(stream.draws(), 2);
    }

    #[test]
    fn test_lost_bits_are_skipped() {
        let mut source = MeasurementNoiseSource::new(
            1.0,
            MeasurementNoiseConfig {
                p_flip0_to_1: 1.0,
                p_flip1_to_0: 1.0,
            },
        );
        let mut rec = record(vec![-1]);
        let mut stream = ScriptedStream::new([0.0]);
        source.apply_measurement_noise(&mut rec, &mut stream);
        assert_eq!(rec.bits, vec![-1]);
        assert_eq!(stream.draws(), 0);
    }

    #[test]
    fn test_inactive_channel_draws_nothing() {
        let mut source = MeasurementNoiseSource::new(0.0, MeasurementNoiseConfig::default());
        let mut rec = record(vec![0, 1, 0]);
        let mut stream = ScriptedStream::new([0.0]);
        source.apply_measurement_noise(&mut rec, &mut stream);
        assert_eq!(rec.bits, vec![0, 1, 0]);
        assert_eq!(stream.draws(), 0);
    }
}
