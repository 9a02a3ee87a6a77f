//! Hardware description: geometry, gate catalog, timing and pulse limits.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One trap site in the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SiteDescriptor {
    /// Stable site identifier.
    pub id: i32,
    /// X coordinate.
    #[serde(default)]
    pub x: f64,
    /// Y coordinate.
    #[serde(default)]
    pub y: f64,
    /// Z coordinate.
    #[serde(default)]
    pub z: f64,
    /// Zone the site belongs to.
    #[serde(default)]
    pub zone_id: i32,
}

/// Connectivity constraint attached to a native gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectivityKind {
    /// Any pair of sites may interact.
    #[default]
    AllToAll,
    /// Targets must be adjacent slots of the 1-D chain.
    NearestNeighborChain,
    /// Target sites must be at Manhattan distance 1 on the grid.
    NearestNeighborGrid,
}

/// An entry of the hardware's native-gate catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeGate {
    /// Gate mnemonic.
    pub name: String,
    /// Number of qubits the gate acts on.
    #[serde(default = "default_arity")]
    pub arity: usize,
    /// Execution duration in nanoseconds.
    #[serde(default)]
    pub duration_ns: f64,
    /// Lower angle bound; the window is ignored unless `angle_max > angle_min`.
    #[serde(default)]
    pub angle_min: f64,
    /// Upper angle bound.
    #[serde(default)]
    pub angle_max: f64,
    /// Connectivity constraint for multi-qubit gates.
    #[serde(default)]
    pub connectivity: ConnectivityKind,
}

fn default_arity() -> usize {
    1
}

/// An unordered pair of site ids allowed to interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InteractionPair {
    /// First site id.
    pub site_a: i32,
    /// Second site id.
    pub site_b: i32,
}

/// Per-gate allow-list of interacting site pairs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InteractionGraph {
    /// Gate mnemonic the allow-list applies to.
    pub gate_name: String,
    /// Pairs of site ids allowed to interact, in either order.
    #[serde(default)]
    pub allowed_pairs: Vec<InteractionPair>,
}

impl InteractionGraph {
    /// Check whether the unordered pair `(a, b)` is allowed.
    pub fn pair_allowed(&self, a: i32, b: i32) -> bool {
        self.allowed_pairs
            .iter()
            .any(|p| (p.site_a == a && p.site_b == b) || (p.site_a == b && p.site_b == a))
    }
}

/// Blockade radius override for a single zone.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockadeZoneOverride {
    /// Zone the override applies to.
    pub zone_id: i32,
    /// Radius; 0 leaves the zone on the model/global radius.
    pub radius: f64,
}

/// Anisotropic and zone-aware blockade model.
///
/// Any field left at 0 is inactive; the legacy global
/// [`HardwareConfig::blockade_radius`] remains the fallback.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockadeModel {
    /// Isotropic radius; overrides the legacy global radius when positive.
    #[serde(default)]
    pub radius: f64,
    /// Maximum separation along X.
    #[serde(default)]
    pub radius_x: f64,
    /// Maximum separation along Y.
    #[serde(default)]
    pub radius_y: f64,
    /// Maximum separation along Z.
    #[serde(default)]
    pub radius_z: f64,
    /// Per-zone radius overrides.
    #[serde(default)]
    pub zone_overrides: Vec<BlockadeZoneOverride>,
}

impl BlockadeModel {
    /// Radius override for `zone`, if one is configured and positive.
    pub fn zone_override_radius(&self, zone: i32) -> Option<f64> {
        self.zone_overrides
            .iter()
            .find(|entry| entry.zone_id == zone && entry.radius > 0.0)
            .map(|entry| entry.radius)
    }

    /// True when any of the model's fields carries data.
    pub fn has_data(&self) -> bool {
        self.radius > 0.0
            || self.radius_x > 0.0
            || self.radius_y > 0.0
            || self.radius_z > 0.0
            || !self.zone_overrides.is_empty()
    }
}

/// Wait and parallelism limits. A value of 0 means unlimited/unused.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingLimits {
    /// Shortest legal `Wait` duration in nanoseconds.
    #[serde(default)]
    pub min_wait_ns: f64,
    /// Longest legal `Wait` duration in nanoseconds.
    #[serde(default)]
    pub max_wait_ns: f64,
    /// Maximum simultaneously active single-qubit gates.
    #[serde(default)]
    pub max_parallel_single_qubit: u32,
    /// Maximum simultaneously active two-qubit gates.
    #[serde(default)]
    pub max_parallel_two_qubit: u32,
    /// Maximum simultaneously active gates per zone.
    #[serde(default)]
    pub max_parallel_per_zone: u32,
    /// Minimum delay between measuring a qubit and gating it again.
    #[serde(default)]
    pub measurement_cooldown_ns: f64,
    /// Duration of a measurement in nanoseconds.
    #[serde(default)]
    pub measurement_duration_ns: f64,
}

/// Pulse parameter window. Zeroed bounds leave the window open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PulseLimits {
    /// Minimum legal detuning.
    #[serde(default)]
    pub detuning_min: f64,
    /// Maximum legal detuning.
    #[serde(default)]
    pub detuning_max: f64,
    /// Minimum pulse duration in nanoseconds.
    #[serde(default)]
    pub duration_min_ns: f64,
    /// Maximum pulse duration in nanoseconds.
    #[serde(default)]
    pub duration_max_ns: f64,
    /// Maximum concurrently playing pulses; validator-side only.
    #[serde(default)]
    pub max_overlapping_pulses: u32,
}

/// A legal atom transport edge between two sites.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransportEdge {
    /// Source site id.
    pub src_site_id: i32,
    /// Destination site id.
    pub dst_site_id: i32,
    /// Physical distance of the edge.
    #[serde(default)]
    pub distance: f64,
    /// Transport duration in nanoseconds.
    #[serde(default)]
    pub duration_ns: f64,
}

/// Limits on atom rearrangement, enforced by the transport validator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoveLimits {
    /// Total displacement budget per atom.
    #[serde(default)]
    pub max_total_displacement_per_atom: f64,
    /// Move count budget per atom.
    #[serde(default)]
    pub max_moves_per_atom: u32,
    /// Move count budget per shot.
    #[serde(default)]
    pub max_moves_per_shot: u32,
    /// Move count budget per configuration change.
    #[serde(default)]
    pub max_moves_per_configuration_change: u32,
    /// When positive, all moves must precede the first gate/measure/pulse.
    #[serde(default)]
    pub rearrangement_window_ns: f64,
}

impl MoveLimits {
    /// True when any limit carries data.
    pub fn has_data(&self) -> bool {
        self.max_total_displacement_per_atom > 0.0
            || self.max_moves_per_atom > 0
            || self.max_moves_per_shot > 0
            || self.max_moves_per_configuration_change > 0
            || self.rearrangement_window_ns > 0.0
    }
}

/// Map from site id to index into [`HardwareConfig::sites`].
pub type SiteIndex = FxHashMap<i32, usize>;

/// Full hardware descriptor for a neutral-atom device.
///
/// The `positions`/`coordinates`/`blockade_radius` trio is the legacy 1.0
/// geometry; `sites`, `site_ids`, the catalogs, and the limit blocks are the
/// 1.1 extensions. Legacy fields stay authoritative when the newer
/// structures are left empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// 1-D positions for atoms (chain view).
    #[serde(default)]
    pub positions: Vec<f64>,
    /// Optional multidimensional coordinates, one row per slot.
    #[serde(default)]
    pub coordinates: Vec<Vec<f64>>,
    /// Effective global blockade radius; 0 disables the check.
    #[serde(default)]
    pub blockade_radius: f64,
    /// Mapping from logical slots into the lattice described by `sites`.
    #[serde(default)]
    pub site_ids: Vec<i32>,
    /// Optional per-gate interaction graphs.
    #[serde(default)]
    pub interaction_graphs: Vec<InteractionGraph>,
    /// Optional anisotropic/zone-aware blockade model.
    #[serde(default)]
    pub blockade_model: BlockadeModel,
    /// Lattice sites.
    #[serde(default)]
    pub sites: Vec<SiteDescriptor>,
    /// Native-gate catalog; empty means no catalog restriction.
    #[serde(default)]
    pub native_gates: Vec<NativeGate>,
    /// Wait and parallelism limits.
    #[serde(default)]
    pub timing_limits: TimingLimits,
    /// Pulse parameter window.
    #[serde(default)]
    pub pulse_limits: PulseLimits,
    /// Legal atom transport edges.
    #[serde(default)]
    pub transport_edges: Vec<TransportEdge>,
    /// Atom rearrangement limits.
    #[serde(default)]
    pub move_limits: MoveLimits,
}

impl HardwareConfig {
    /// Build the site-id → site-index lookup table.
    pub fn build_site_index(&self) -> SiteIndex {
        let mut index = SiteIndex::default();
        index.reserve(self.sites.len());
        for (idx, site) in self.sites.iter().enumerate() {
            index.insert(site.id, idx);
        }
        index
    }

    /// Resolve a logical slot to its site descriptor, if the slot is mapped.
    pub fn site_for_slot(&self, index: &SiteIndex, slot: usize) -> Option<&SiteDescriptor> {
        let site_id = *self.site_ids.get(slot)?;
        self.site_by_id(index, site_id)
    }

    /// Resolve a site id to its descriptor.
    pub fn site_by_id(&self, index: &SiteIndex, site_id: i32) -> Option<&SiteDescriptor> {
        index.get(&site_id).and_then(|&idx| self.sites.get(idx))
    }

    /// Zone a slot belongs to; slots outside the lattice fall into zone 0.
    pub fn zone_for_slot(&self, index: &SiteIndex, slot: usize) -> i32 {
        self.site_for_slot(index, slot)
            .map(|site| site.zone_id)
            .unwrap_or(0)
    }

    /// Site id a slot maps onto, if any.
    pub fn site_id_for_slot(&self, index: &SiteIndex, slot: usize) -> Option<i32> {
        self.site_for_slot(index, slot).map(|site| site.id)
    }

    /// Euclidean distance between two sites, by id.
    ///
    /// Returns `f64::INFINITY` when either site is unknown.
    pub fn distance_between_sites(&self, index: &SiteIndex, site_a: i32, site_b: i32) -> f64 {
        match (self.site_by_id(index, site_a), self.site_by_id(index, site_b)) {
            (Some(sa), Some(sb)) => {
                let dx = sa.x - sb.x;
                let dy = sa.y - sb.y;
                let dz = sa.z - sb.z;
                (dx * dx + dy * dy + dz * dz).sqrt()
            }
            _ => f64::INFINITY,
        }
    }

    /// Look up the native catalog entry matching a name/arity pair.
    pub fn find_native_gate(&self, name: &str, arity: usize) -> Option<&NativeGate> {
        self.native_gates
            .iter()
            .find(|g| g.name == name && g.arity == arity)
    }

    /// Look up the interaction graph for a gate, if one is declared.
    pub fn find_interaction_graph(&self, gate_name: &str) -> Option<&InteractionGraph> {
        self.interaction_graphs
            .iter()
            .find(|g| g.gate_name == gate_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_hw() -> HardwareConfig {
        HardwareConfig {
            sites: vec![
                SiteDescriptor { id: 10, x: 0.0, y: 0.0, z: 0.0, zone_id: 1 },
                SiteDescriptor { id: 11, x: 1.0, y: 0.0, z: 0.0, zone_id: 1 },
                SiteDescriptor { id: 12, x: 0.0, y: 1.0, z: 0.0, zone_id: 2 },
            ],
            site_ids: vec![10, 11, 12],
            ..HardwareConfig::default()
        }
    }

    #[test]
    fn test_site_lookup() {
        let hw = grid_hw();
        let index = hw.build_site_index();
        assert_eq!(hw.site_for_slot(&index, 0).unwrap().id, 10);
        assert_eq!(hw.site_id_for_slot(&index, 2), Some(12));
        assert_eq!(hw.site_id_for_slot(&index, 5), None);
        assert_eq!(hw.zone_for_slot(&index, 2), 2);
        assert_eq!(hw.zone_for_slot(&index, 99), 0);
    }

    #[test]
    fn test_distance_between_sites() {
        let hw = grid_hw();
        let index = hw.build_site_index();
        assert!((hw.distance_between_sites(&index, 10, 11) - 1.0).abs() < 1e-12);
        assert!(hw.distance_between_sites(&index, 10, 99).is_infinite());
    }

    #[test]
    fn test_native_gate_lookup_matches_name_and_arity() {
        let mut hw = HardwareConfig::default();
        hw.native_gates.push(NativeGate {
            name: "CX".into(),
            arity: 2,
            duration_ns: 200.0,
            angle_min: 0.0,
            angle_max: 0.0,
            connectivity: ConnectivityKind::NearestNeighborChain,
        });
        assert!(hw.find_native_gate("CX", 2).is_some());
        assert!(hw.find_native_gate("CX", 1).is_none());
        assert!(hw.find_native_gate("CZ", 2).is_none());
    }

    #[test]
    fn test_interaction_graph_pair_allowed_is_unordered() {
        let graph = InteractionGraph {
            gate_name: "CZ".into(),
            allowed_pairs: vec![InteractionPair { site_a: 1, site_b: 2 }],
        };
        assert!(graph.pair_allowed(1, 2));
        assert!(graph.pair_allowed(2, 1));
        assert!(!graph.pair_allowed(1, 3));
    }

    #[test]
    fn test_zone_override_radius() {
        let model = BlockadeModel {
            zone_overrides: vec![
                BlockadeZoneOverride { zone_id: 1, radius: 2.5 },
                BlockadeZoneOverride { zone_id: 2, radius: 0.0 },
            ],
            ..BlockadeModel::default()
        };
        assert_eq!(model.zone_override_radius(1), Some(2.5));
        assert_eq!(model.zone_override_radius(2), None);
        assert_eq!(model.zone_override_radius(3), None);
    }

    #[test]
    fn test_sparse_json_deserializes_with_defaults() {
        let hw: HardwareConfig = serde_json::from_str(
            r#"{"positions":[0.0,1.0],"blockade_radius":1.5}"#,
        )
        .unwrap();
        assert_eq!(hw.positions, vec![0.0, 1.0]);
        assert_eq!(hw.blockade_radius, 1.5);
        assert!(hw.native_gates.is_empty());
        assert_eq!(hw.timing_limits.min_wait_ns, 0.0);
    }
}
