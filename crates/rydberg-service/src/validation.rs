//! Static program validators run before execution.

use rustc_hash::{FxHashMap, FxHashSet};

use rydberg_isa::{
    blockade_violation_reason, HardwareConfig, Instruction, SiteIndex, VmError, VmResult,
};

use crate::job::JobRequest;

const POSITION_TOLERANCE: f64 = 1e-6;

/// A whole-program check against the hardware description.
pub trait Validator: Send + Sync {
    /// Short identifier used in diagnostics.
    fn name(&self) -> &str;

    /// Validate `program` against `hardware`; the first violation aborts.
    fn validate(&self, hardware: &HardwareConfig, program: &[Instruction]) -> VmResult<()>;
}

/// Ordered collection of validators.
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a validator; runs after all previously registered ones.
    pub fn register(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    /// Run every validator in registration order.
    pub fn run_all(&self, hardware: &HardwareConfig, program: &[Instruction]) -> VmResult<()> {
        for validator in &self.validators {
            validator.validate(hardware, program)?;
        }
        Ok(())
    }

    /// Names of the registered validators, in order.
    pub fn validator_names(&self) -> Vec<&str> {
        self.validators.iter().map(|v| v.name()).collect()
    }
}

/// Number of qubit slots the configuration can address.
fn configuration_limit(hardware: &HardwareConfig) -> usize {
    if !hardware.site_ids.is_empty() {
        return hardware.site_ids.len();
    }
    if !hardware.positions.is_empty() {
        return hardware.positions.len();
    }
    if !hardware.coordinates.is_empty() {
        return hardware.coordinates.len();
    }
    hardware.sites.len()
}

fn describe_slot(hardware: &HardwareConfig, index: &SiteIndex, slot: usize) -> String {
    if let Some(site) = hardware.site_for_slot(index, slot) {
        return format!(
            "slot {slot} (site {} coords=({},{},{}) zone={})",
            site.id, site.x, site.y, site.z, site.zone_id
        );
    }
    if let Some(coords) = hardware.coordinates.get(slot) {
        let x = coords.first().copied().unwrap_or(0.0);
        let y = coords.get(1).copied().unwrap_or(0.0);
        let z = coords.get(2).copied().unwrap_or(0.0);
        return format!("slot {slot} coords=({x},{y},{z})");
    }
    if let Some(position) = hardware.positions.get(slot) {
        return format!("slot {slot} coords=({position},0,0)");
    }
    format!("slot {slot}")
}

fn describe_slot_pair(
    hardware: &HardwareConfig,
    index: &SiteIndex,
    slot_a: usize,
    slot_b: usize,
) -> String {
    format!(
        "{} and {}",
        describe_slot(hardware, index, slot_a),
        describe_slot(hardware, index, slot_b)
    )
}

/// Checks that every gate target addresses an occupied slot.
#[derive(Debug, Default)]
pub struct ActiveQubitsValidator;

impl Validator for ActiveQubitsValidator {
    fn name(&self) -> &str {
        "active_qubits"
    }

    fn validate(&self, hardware: &HardwareConfig, program: &[Instruction]) -> VmResult<()> {
        let limit = configuration_limit(hardware);
        if limit == 0 {
            return Ok(());
        }
        for instr in program {
            let Some(gate) = instr.as_gate() else {
                continue;
            };
            for &target in &gate.targets {
                if target >= limit {
                    return Err(VmError::OutOfRange(format!(
                        "gate {} references qubit {target} but the configuration only \
                         allocates qubits 0..{}",
                        gate.name,
                        limit - 1
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Checks two-qubit gates against interaction graphs and the blockade.
#[derive(Debug, Default)]
pub struct BlockadeValidator;

impl Validator for BlockadeValidator {
    fn name(&self) -> &str {
        "blockade"
    }

    fn validate(&self, hardware: &HardwareConfig, program: &[Instruction]) -> VmResult<()> {
        let limit = configuration_limit(hardware);
        if limit == 0 {
            return Ok(());
        }
        let index = hardware.build_site_index();
        for instr in program {
            let Some(gate) = instr.as_gate() else {
                continue;
            };
            if gate.arity() < 2 {
                continue;
            }
            for &target in &gate.targets {
                if target >= limit {
                    return Err(VmError::OutOfRange(format!(
                        "gate {} references qubit {target} but the configuration only \
                         allocates qubits 0..{}",
                        gate.name,
                        limit - 1
                    )));
                }
            }
            let graph = hardware.find_interaction_graph(&gate.name);
            for i in 0..gate.targets.len() {
                for j in (i + 1)..gate.targets.len() {
                    let q0 = gate.targets[i];
                    let q1 = gate.targets[j];
                    let pair = describe_slot_pair(hardware, &index, q0, q1);
                    if let Some(graph) = graph {
                        let site0 = hardware.site_id_for_slot(&index, q0);
                        let site1 = hardware.site_id_for_slot(&index, q1);
                        let allowed = match (site0, site1) {
                            (Some(a), Some(b)) => graph.pair_allowed(a, b),
                            _ => false,
                        };
                        if !allowed {
                            return Err(VmError::ConnectivityViolation(format!(
                                "gate {} between {pair} violates interaction graph constraints",
                                gate.name
                            )));
                        }
                    }
                    if let Some(reason) = blockade_violation_reason(hardware, &index, q0, q1) {
                        return Err(VmError::BlockadeViolation(format!(
                            "gate {} between {pair} violates {reason}",
                            gate.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct TransportGraph {
    adjacency: FxHashMap<i32, FxHashSet<i32>>,
}

impl TransportGraph {
    fn add_edge(&mut self, src: i32, dst: i32) {
        self.adjacency.entry(src).or_default().insert(dst);
        self.adjacency.entry(dst).or_default().insert(src);
    }

    fn allows(&self, src: i32, dst: i32) -> bool {
        self.adjacency
            .get(&src)
            .is_some_and(|neighbors| neighbors.contains(&dst))
    }

    fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}

fn find_site_id_for_position(hardware: &HardwareConfig, position: f64) -> Option<i32> {
    for (idx, &p) in hardware.positions.iter().enumerate() {
        if (p - position).abs() < POSITION_TOLERANCE {
            return hardware
                .site_ids
                .get(idx)
                .copied()
                .or(Some(idx as i32));
        }
    }
    hardware
        .sites
        .iter()
        .find(|site| (site.x - position).abs() < POSITION_TOLERANCE)
        .map(|site| site.id)
}

#[derive(Debug, Clone, Copy, Default)]
struct MoveStats {
    moves: u32,
    displacement: f64,
}

/// Checks `MoveAtom` instructions against transport edges and move limits.
#[derive(Debug, Default)]
pub struct TransportValidator;

impl Validator for TransportValidator {
    fn name(&self) -> &str {
        "transport"
    }

    fn validate(&self, hardware: &HardwareConfig, program: &[Instruction]) -> VmResult<()> {
        if hardware.transport_edges.is_empty() && !hardware.move_limits.has_data() {
            return Ok(());
        }
        let slot_count = configuration_limit(hardware);
        if slot_count == 0 {
            return Ok(());
        }
        let index = hardware.build_site_index();

        let mut slot_site_ids: Vec<i32> = (0..slot_count)
            .map(|slot| {
                hardware
                    .site_ids
                    .get(slot)
                    .copied()
                    .unwrap_or(slot as i32)
            })
            .collect();
        let mut slot_positions: Vec<f64> = (0..slot_count)
            .map(|slot| {
                hardware.positions.get(slot).copied().unwrap_or_else(|| {
                    hardware
                        .site_for_slot(&index, slot)
                        .map(|site| site.x)
                        .unwrap_or(0.0)
                })
            })
            .collect();

        let mut graph = TransportGraph::default();
        for edge in &hardware.transport_edges {
            graph.add_edge(edge.src_site_id, edge.dst_site_id);
        }

        let limits = &hardware.move_limits;
        let mut seen_main_program = false;
        let mut stats = vec![MoveStats::default(); slot_count];
        let mut total_moves: u32 = 0;

        for instr in program {
            match instr {
                Instruction::MoveAtom { atom, position } => {
                    if limits.rearrangement_window_ns > 0.0 && seen_main_program {
                        return Err(VmError::InvalidArgument(
                            "MoveAtom violates rearrangement window constraints".into(),
                        ));
                    }
                    let slot = *atom;
                    if slot >= slot_count {
                        return Err(VmError::OutOfRange(
                            "MoveAtom references invalid atom index".into(),
                        ));
                    }
                    let prev_site_id = slot_site_ids[slot];
                    let prev_position = slot_positions[slot];
                    let target_site_id = find_site_id_for_position(hardware, *position);

                    if !graph.is_empty() {
                        let Some(target_site_id) = target_site_id else {
                            return Err(VmError::InvalidArgument(format!(
                                "MoveAtom target position {position} has no transport edge"
                            )));
                        };
                        if !graph.allows(prev_site_id, target_site_id) {
                            return Err(VmError::InvalidArgument(format!(
                                "MoveAtom from site {prev_site_id} to {target_site_id} \
                                 is not allowed by transport edges"
                            )));
                        }
                    }

                    let mut displacement = (position - prev_position).abs();
                    if let Some(target_site_id) = target_site_id {
                        let site_distance =
                            hardware.distance_between_sites(&index, prev_site_id, target_site_id);
                        if site_distance.is_finite() {
                            displacement = site_distance;
                        }
                    }

                    stats[slot].moves += 1;
                    stats[slot].displacement += displacement;
                    total_moves += 1;

                    if limits.max_moves_per_atom > 0 && stats[slot].moves > limits.max_moves_per_atom
                    {
                        return Err(VmError::InvalidArgument(
                            "MoveAtom exceeds per-atom move limit".into(),
                        ));
                    }
                    if limits.max_moves_per_shot > 0 && total_moves > limits.max_moves_per_shot {
                        return Err(VmError::InvalidArgument(
                            "MoveAtom exceeds per-shot move limit".into(),
                        ));
                    }
                    if limits.max_moves_per_configuration_change > 0
                        && total_moves > limits.max_moves_per_configuration_change
                    {
                        return Err(VmError::InvalidArgument(
                            "MoveAtom exceeds per-configuration move limit".into(),
                        ));
                    }
                    if limits.max_total_displacement_per_atom > 0.0
                        && stats[slot].displacement > limits.max_total_displacement_per_atom
                    {
                        return Err(VmError::InvalidArgument(format!(
                            "atom {slot} exceeds displacement limit"
                        )));
                    }

                    slot_positions[slot] = *position;
                    slot_site_ids[slot] = target_site_id.unwrap_or(-1);
                }
                Instruction::ApplyGate(_)
                | Instruction::Measure { .. }
                | Instruction::Pulse { .. } => {
                    seen_main_program = true;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Assemble the validator registry for a job.
///
/// The active-qubits validator always runs. Blockade and transport
/// validators join when the hardware carries the relevant data, or when the
/// request metadata forces them with the `blockade_validator` /
/// `transport_validator` keys.
pub fn make_validator_registry_for(job: &JobRequest, hw: &HardwareConfig) -> ValidatorRegistry {
    let mut registry = ValidatorRegistry::new();
    registry.register(Box::new(ActiveQubitsValidator));

    let wants_blockade = job.metadata.contains_key("blockade_validator");
    let has_blockade =
        wants_blockade || hw.blockade_radius > 0.0 || hw.blockade_model.has_data();
    if has_blockade {
        registry.register(Box::new(BlockadeValidator));
    }

    let wants_transport = job.metadata.contains_key("transport_validator");
    let has_transport =
        wants_transport || !hw.transport_edges.is_empty() || hw.move_limits.has_data();
    if has_transport {
        registry.register(Box::new(TransportValidator));
    }

    registry
}
