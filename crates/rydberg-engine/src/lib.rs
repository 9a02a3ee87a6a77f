//! Rydberg Statevector Engine
//!
//! The per-shot interpreter for neutral-atom ISA programs. A
//! [`StatevectorEngine`] owns an amplitude vector behind a [`StateBackend`],
//! validates hardware constraints (native catalog, connectivity, blockade,
//! cooldown, wait/pulse windows), applies ideal unitaries, invokes the
//! attached noise pipeline at gate/idle/measurement boundaries, samples
//! measurements, and emits structured [`ExecutionLog`] events.
//!
//! One engine executes one shot. The job runner constructs a fresh engine
//! per shot with its own seed and its own clone of the noise model.
//!
//! ```rust
//! use rydberg_engine::StatevectorEngine;
//! use rydberg_isa::{HardwareConfig, Instruction};
//!
//! let mut hw = HardwareConfig::default();
//! hw.positions = vec![0.0, 1.0];
//! hw.blockade_radius = 1.5;
//!
//! let mut engine = StatevectorEngine::with_seed(hw, 1);
//! engine
//!     .run(&[
//!         Instruction::alloc_array(2),
//!         Instruction::gate("H", [1]),
//!         Instruction::gate("CX", [1, 0]),
//!     ])
//!     .unwrap();
//!
//! let amps = engine.state_vector();
//! assert!((amps[0].norm() - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
//! assert!((amps[3].norm() - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
//! ```
//!
//! [`ExecutionLog`]: rydberg_isa::ExecutionLog

pub mod backend;
pub mod engine;
pub mod progress;

pub use backend::{CpuStateBackend, StateBackend};
pub use engine::{PulseEvent, StatevectorEngine, StatevectorState};
pub use progress::ProgressReporter;
