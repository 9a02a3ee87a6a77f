//! Program instructions.

use serde::{Deserialize, Serialize};

/// A gate application payload.
///
/// `name` is a hardware gate mnemonic (`"X"`, `"H"`, `"Z"`, `"CX"`, `"CZ"`,
/// ...); `targets` are logical qubit slots; `param` is an optional rotation
/// angle or detuning parameter whose meaning depends on the gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Gate mnemonic.
    pub name: String,
    /// Qubit slots the gate acts on, control first for two-qubit gates.
    pub targets: Vec<usize>,
    /// Angle or other parameter.
    #[serde(default)]
    pub param: f64,
}

impl Gate {
    /// Create a gate payload.
    pub fn new(name: impl Into<String>, targets: impl IntoIterator<Item = usize>) -> Self {
        Self {
            name: name.into(),
            targets: targets.into_iter().collect(),
            param: 0.0,
        }
    }

    /// Create a gate payload with a parameter.
    pub fn with_param(
        name: impl Into<String>,
        targets: impl IntoIterator<Item = usize>,
        param: f64,
    ) -> Self {
        Self {
            param,
            ..Self::new(name, targets)
        }
    }

    /// Number of qubits the gate acts on.
    #[inline]
    pub fn arity(&self) -> usize {
        self.targets.len()
    }
}

/// One hardware-level instruction of a straight-line program.
///
/// Serialized form is internally tagged on `op`, so a gate application
/// reads `{"op":"ApplyGate","name":"CX","targets":[1,0],"param":0.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Instruction {
    /// Reset the machine to `n_qubits` atoms in `|0…0⟩` at logical time 0.
    AllocArray {
        /// Number of qubits to allocate.
        n_qubits: usize,
    },
    /// Apply a gate from the hardware catalog.
    ApplyGate(Gate),
    /// Measure the listed qubits, in order.
    Measure {
        /// Qubit slots to read out, pairwise distinct.
        targets: Vec<usize>,
    },
    /// Update the 1-D position of one atom.
    MoveAtom {
        /// Atom slot to move.
        atom: usize,
        /// New 1-D position.
        position: f64,
    },
    /// Idle for a duration.
    Wait {
        /// Idle duration in nanoseconds.
        #[serde(rename = "duration")]
        duration_ns: f64,
    },
    /// Record a raw pulse; does not evolve the state.
    Pulse {
        /// Qubit slot the pulse addresses.
        target: usize,
        /// Laser detuning.
        detuning: f64,
        /// Pulse duration in nanoseconds.
        #[serde(rename = "duration")]
        duration_ns: f64,
    },
}

impl Instruction {
    /// Create an `AllocArray` instruction.
    pub fn alloc_array(n_qubits: usize) -> Self {
        Self::AllocArray { n_qubits }
    }

    /// Create an unparameterized gate instruction.
    pub fn gate(name: impl Into<String>, targets: impl IntoIterator<Item = usize>) -> Self {
        Self::ApplyGate(Gate::new(name, targets))
    }

    /// Create a parameterized gate instruction.
    pub fn gate_with_param(
        name: impl Into<String>,
        targets: impl IntoIterator<Item = usize>,
        param: f64,
    ) -> Self {
        Self::ApplyGate(Gate::with_param(name, targets, param))
    }

    /// Create a measurement instruction.
    pub fn measure(targets: impl IntoIterator<Item = usize>) -> Self {
        Self::Measure {
            targets: targets.into_iter().collect(),
        }
    }

    /// Create a move instruction.
    pub fn move_atom(atom: usize, position: f64) -> Self {
        Self::MoveAtom { atom, position }
    }

    /// Create a wait instruction.
    pub fn wait(duration_ns: f64) -> Self {
        Self::Wait { duration_ns }
    }

    /// Create a pulse instruction.
    pub fn pulse(target: usize, detuning: f64, duration_ns: f64) -> Self {
        Self::Pulse {
            target,
            detuning,
            duration_ns,
        }
    }

    /// Check if this is a gate application.
    pub fn is_gate(&self) -> bool {
        matches!(self, Instruction::ApplyGate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self, Instruction::Measure { .. })
    }

    /// Check if this is a wait.
    pub fn is_wait(&self) -> bool {
        matches!(self, Instruction::Wait { .. })
    }

    /// Get the gate payload if this is a gate application.
    pub fn as_gate(&self) -> Option<&Gate> {
        match self {
            Instruction::ApplyGate(g) => Some(g),
            _ => None,
        }
    }

    /// Get the op name of this instruction.
    pub fn op_name(&self) -> &'static str {
        match self {
            Instruction::AllocArray { .. } => "AllocArray",
            Instruction::ApplyGate(_) => "ApplyGate",
            Instruction::Measure { .. } => "Measure",
            Instruction::MoveAtom { .. } => "MoveAtom",
            Instruction::Wait { .. } => "Wait",
            Instruction::Pulse { .. } => "Pulse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_instruction() {
        let instr = Instruction::gate("H", [0]);
        assert!(instr.is_gate());
        assert_eq!(instr.op_name(), "ApplyGate");
        let gate = instr.as_gate().unwrap();
        assert_eq!(gate.name, "H");
        assert_eq!(gate.arity(), 1);
        assert_eq!(gate.param, 0.0);
    }

    #[test]
    fn test_measure_instruction() {
        let instr = Instruction::measure([0, 2]);
        assert!(instr.is_measure());
        match &instr {
            Instruction::Measure { targets } => assert_eq!(targets, &vec![0, 2]),
            _ => panic!("expected Measure"),
        }
    }

    #[test]
    fn test_wire_shape_is_op_tagged() {
        let instr = Instruction::gate_with_param("CX", [1, 0], 0.5);
        let json = serde_json::to_value(&instr).unwrap();
        assert_eq!(json["op"], "ApplyGate");
        assert_eq!(json["name"], "CX");
        assert_eq!(json["targets"], serde_json::json!([1, 0]));
        assert_eq!(json["param"], 0.5);
    }

    #[test]
    fn test_wait_serializes_as_duration() {
        let json = serde_json::to_value(Instruction::wait(12.5)).unwrap();
        assert_eq!(json["op"], "Wait");
        assert_eq!(json["duration"], 12.5);

        let back: Instruction =
            serde_json::from_str(r#"{"op":"Wait","duration":12.5}"#).unwrap();
        assert_eq!(back, Instruction::wait(12.5));
    }

    #[test]
    fn test_pulse_round_trip() {
        let instr = Instruction::pulse(1, -0.5, 10.0);
        let json = serde_json::to_string(&instr).unwrap();
        let back: Instruction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, instr);
    }

    #[test]
    fn test_gate_param_defaults_to_zero() {
        let back: Instruction =
            serde_json::from_str(r#"{"op":"ApplyGate","name":"X","targets":[0]}"#).unwrap();
        assert_eq!(back, Instruction::gate("X", [0]));
    }
}
