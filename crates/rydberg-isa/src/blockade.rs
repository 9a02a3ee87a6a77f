//! Spatial separation and Rydberg-blockade checks.

use crate::hardware::{HardwareConfig, SiteIndex};

/// Per-axis separation between two slots plus the Euclidean distance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpatialDelta {
    /// Separation along X.
    pub dx: f64,
    /// Separation along Y.
    pub dy: f64,
    /// Separation along Z.
    pub dz: f64,
    /// Euclidean distance; infinite when the geometry is insufficient.
    pub distance: f64,
}

/// Compute the separation between two slots.
///
/// Geometry sources are consulted in order of preference: multidimensional
/// `coordinates`, then site descriptors, then the legacy 1-D `positions`.
/// Slots covered by none of them yield an infinite distance.
pub fn compute_spatial_delta(
    hw: &HardwareConfig,
    index: &SiteIndex,
    q0: usize,
    q1: usize,
) -> SpatialDelta {
    if q0 < hw.coordinates.len() && q1 < hw.coordinates.len() {
        let coord = |row: &Vec<f64>, offset: usize| row.get(offset).copied().unwrap_or(0.0);
        let lhs = &hw.coordinates[q0];
        let rhs = &hw.coordinates[q1];
        let dx = coord(lhs, 0) - coord(rhs, 0);
        let dy = coord(lhs, 1) - coord(rhs, 1);
        let dz = coord(lhs, 2) - coord(rhs, 2);
        return SpatialDelta {
            dx,
            dy,
            dz,
            distance: (dx * dx + dy * dy + dz * dz).sqrt(),
        };
    }
    if let (Some(sa), Some(sb)) = (hw.site_for_slot(index, q0), hw.site_for_slot(index, q1)) {
        let dx = sa.x - sb.x;
        let dy = sa.y - sb.y;
        let dz = sa.z - sb.z;
        return SpatialDelta {
            dx,
            dy,
            dz,
            distance: (dx * dx + dy * dy + dz * dz).sqrt(),
        };
    }
    if q0 < hw.positions.len() && q1 < hw.positions.len() {
        let dx = hw.positions[q0] - hw.positions[q1];
        return SpatialDelta {
            dx,
            dy: 0.0,
            dz: 0.0,
            distance: dx.abs(),
        };
    }
    SpatialDelta {
        distance: f64::INFINITY,
        ..SpatialDelta::default()
    }
}

fn axis_limit_violation(limit: f64, separation: f64, axis: &str) -> Option<String> {
    if limit > 0.0 && separation.abs() > limit {
        Some(format!("anisotropic blockade ({axis}-axis limit {limit})"))
    } else {
        None
    }
}

/// Check the pair `(q0, q1)` against the effective blockade.
///
/// Returns `None` when the pair is legal, or a human-readable description of
/// the violated constraint. The effective radius is the zone override of
/// `q0`'s zone when configured, else the model radius, else the legacy
/// global radius; a non-positive effective radius disables the isotropic
/// check. Anisotropic per-axis limits are checked first.
pub fn blockade_violation_reason(
    hw: &HardwareConfig,
    index: &SiteIndex,
    q0: usize,
    q1: usize,
) -> Option<String> {
    let delta = compute_spatial_delta(hw, index, q0, q1);
    if !delta.distance.is_finite() {
        return Some("insufficient geometry for blockade check".to_string());
    }

    let model = &hw.blockade_model;
    if let Some(reason) = axis_limit_violation(model.radius_x, delta.dx, "x")
        .or_else(|| axis_limit_violation(model.radius_y, delta.dy, "y"))
        .or_else(|| axis_limit_violation(model.radius_z, delta.dz, "z"))
    {
        return Some(reason);
    }

    let zone = hw.zone_for_slot(index, q0);
    let zone_radius = model.zone_override_radius(zone);
    let effective_radius = zone_radius.unwrap_or(if model.radius > 0.0 {
        model.radius
    } else {
        hw.blockade_radius
    });
    if effective_radius <= 0.0 {
        return None;
    }
    if delta.distance > effective_radius {
        return Some(match zone_radius {
            Some(radius) => format!("zone {zone} blockade radius {radius}"),
            None => format!("blockade radius {effective_radius}"),
        });
    }
    None
}
