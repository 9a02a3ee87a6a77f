//! Randomness abstraction for noise channels.

use rand::{Rng, RngCore};

/// A stream of uniform floating-point samples.
///
/// Channels take `&mut dyn RandomStream` so the noise layer stays agnostic
/// of the concrete generator the engine runs.
pub trait RandomStream {
    /// Draw a sample from the half-open interval `[lo, hi)`.
    ///
    /// Degenerate ranges (`hi <= lo`) clamp to `lo`.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64;
}

/// [`RandomStream`] backed by any [`rand::RngCore`] generator.
///
/// The engine wraps its per-shot PRNG in one of these for the duration of a
/// noise hook.
pub struct PrngStream<'a, R: RngCore> {
    rng: &'a mut R,
}

impl<'a, R: RngCore> PrngStream<'a, R> {
    /// Borrow a generator as a stream.
    pub fn new(rng: &'a mut R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore> RandomStream for PrngStream<'_, R> {
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        lo + (hi - lo) * self.rng.r#gen::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_mt::Mt19937GenRand64;

    #[test]
    fn test_uniform_stays_in_range() {
        let mut rng = Mt19937GenRand64::seed_from_u64(7);
        let mut stream = PrngStream::new(&mut rng);
        for _ in 0..1000 {
            let v = stream.uniform(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&v));
        }
    }

    #[test]
    fn test_degenerate_range_clamps_to_lo() {
        let mut rng = Mt19937GenRand64::seed_from_u64(7);
        let mut stream = PrngStream::new(&mut rng);
        assert_eq!(stream.uniform(1.5, 1.5), 1.5);
        assert_eq!(stream.uniform(2.0, -1.0), 2.0);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Mt19937GenRand64::seed_from_u64(42);
        let mut b = Mt19937GenRand64::seed_from_u64(42);
        let mut sa = PrngStream::new(&mut a);
        let mut sb = PrngStream::new(&mut b);
        for _ in 0..32 {
            assert_eq!(sa.uniform(0.0, 1.0), sb.uniform(0.0, 1.0));
        }
    }
}
