//! Workspace-wide error taxonomy.
//!
//! Every fallible operation in the VM — config construction, per-shot
//! execution, job orchestration — reports one of these kinds. Engine-level
//! errors are fatal for the shot that raised them; the job runner surfaces
//! the first one and discards partial results.

use thiserror::Error;

/// Errors raised by the neutral-atom VM.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum VmError {
    /// Malformed operand: non-positive allocation, negative duration,
    /// parameter outside its window, identical two-qubit targets.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Qubit index outside `[0, n_qubits)`.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Instruction issued before the first `AllocArray`.
    #[error("invalid instruction sequence: {0}")]
    InvalidSequence(String),

    /// Gate name/arity missing from the configured native catalog.
    #[error("unsupported gate: {0}")]
    UnsupportedGate(String),

    /// Measurement cooldown or wait/pulse window not satisfied.
    #[error("timing violation: {0}")]
    TimingViolation(String),

    /// Two-qubit gate pair exceeds the effective blockade.
    #[error("blockade violation: {0}")]
    BlockadeViolation(String),

    /// Native-gate connectivity constraint broken.
    #[error("connectivity violation: {0}")]
    ConnectivityViolation(String),

    /// Zero-norm state at measurement or an unsampleable outcome.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Noise configuration rejected at build time.
    #[error("invalid noise configuration: {0}")]
    InvalidConfig(String),

    /// ISA version outside the supported set.
    #[error("unsupported ISA version {requested} (supported: {supported})")]
    UnsupportedVersion {
        /// The version the job asked for.
        requested: String,
        /// Comma-separated supported versions.
        supported: String,
    },
}

/// Result alias used across the workspace.
pub type VmResult<T> = Result<T, VmError>;
