//! Concrete noise channels.

pub mod amplitude_damping;
pub mod correlated_pauli;
pub mod idle_dephasing;
pub mod idle_phase_drift;
pub mod loss_tracking;
pub mod measurement;
pub mod phase_kick;
pub mod single_qubit_pauli;
pub mod two_qubit_pauli;

pub use amplitude_damping::AmplitudeDampingSource;
pub use correlated_pauli::CorrelatedPauliSource;
pub use idle_dephasing::IdleDephasingSource;
pub use idle_phase_drift::IdlePhaseDriftSource;
pub use loss_tracking::LossTrackingSource;
pub use measurement::MeasurementNoiseSource;
pub use phase_kick::PhaseKickSource;
pub use single_qubit_pauli::SingleQubitPauliSource;
pub use two_qubit_pauli::TwoQubitPauliSource;
