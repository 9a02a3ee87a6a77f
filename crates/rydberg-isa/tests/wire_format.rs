//! Documented instruction payload shapes.

use rydberg_isa::Instruction;

#[test]
fn program_round_trips_through_documented_payloads() {
    let program = vec![
        Instruction::alloc_array(3),
        Instruction::gate("H", [0]),
        Instruction::gate_with_param("CZ", [0, 1], 0.25),
        Instruction::move_atom(2, -1.5),
        Instruction::wait(100.0),
        Instruction::pulse(1, 0.5, 20.0),
        Instruction::measure([0, 1, 2]),
    ];

    let json = serde_json::to_string(&program).unwrap();
    let back: Vec<Instruction> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, program);
}

#[test]
fn payloads_match_documented_field_names() {
    let cases = [
        (
            Instruction::alloc_array(2),
            r#"{"op":"AllocArray","n_qubits":2}"#,
        ),
        (
            Instruction::measure([1, 0]),
            r#"{"op":"Measure","targets":[1,0]}"#,
        ),
        (
            Instruction::move_atom(0, 2.5),
            r#"{"op":"MoveAtom","atom":0,"position":2.5}"#,
        ),
        (Instruction::wait(5.0), r#"{"op":"Wait","duration":5.0}"#),
        (
            Instruction::pulse(0, -1.0, 3.0),
            r#"{"op":"Pulse","target":0,"detuning":-1.0,"duration":3.0}"#,
        ),
    ];
    for (instr, expected) in cases {
        let value = serde_json::to_value(&instr).unwrap();
        let expected: serde_json::Value = serde_json::from_str(expected).unwrap();
        assert_eq!(value, expected);
    }
}

#[test]
fn external_programs_parse_without_optional_fields() {
    let json = r#"[
        {"op": "AllocArray", "n_qubits": 2},
        {"op": "ApplyGate", "name": "H", "targets": [1]},
        {"op": "ApplyGate", "name": "CX", "targets": [1, 0]},
        {"op": "Measure", "targets": [0, 1]}
    ]"#;
    let program: Vec<Instruction> = serde_json::from_str(json).unwrap();
    assert_eq!(program.len(), 4);
    assert_eq!(program[2].as_gate().unwrap().param, 0.0);
}
