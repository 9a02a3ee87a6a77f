//! Rydberg Noise Pipeline
//!
//! Composable stochastic channels applied at gate, idle, and measurement
//! boundaries of a statevector shot. A channel implements [`NoiseEngine`] —
//! four optional hooks plus [`NoiseEngine::clone_box`] so every shot can own
//! an independent copy (loss tracking carries mutable per-shot state).
//!
//! [`CompositeNoiseEngine`] chains channels in order; the order matters
//! because later channels observe the amplitudes left by earlier ones.
//! [`SimpleNoiseEngine::new`] validates a [`SimpleNoiseConfig`] and
//! assembles the standard pipeline:
//!
//! 1. loss tracking
//! 2. measurement flip/readout
//! 3. amplitude damping
//! 4. single-qubit Pauli
//! 5. two-qubit independent Pauli
//! 6. correlated two-qubit Pauli
//! 7. phase kicks
//! 8. idle dephasing
//! 9. idle phase drift
//!
//! Channels draw randomness exclusively through the [`RandomStream`]
//! abstraction and never see the concrete PRNG.

pub mod config;
pub mod engine;
pub mod pauli;
pub mod sources;
pub mod stream;

pub use config::{
    AmplitudeDampingConfig, GateNoiseConfig, LossRuntimeConfig, MeasurementNoiseConfig,
    PhaseNoiseConfig, SimpleNoiseConfig, SimpleNoiseEngine, SingleQubitPauliConfig,
    TwoQubitCorrelatedPauliConfig,
};
pub use engine::{CompositeNoiseEngine, NoiseEngine};
pub use stream::{PrngStream, RandomStream};
