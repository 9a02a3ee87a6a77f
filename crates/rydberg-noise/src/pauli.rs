//! Pauli and phase kernels shared by the noise channels.

use num_complex::Complex64;

use crate::config::SingleQubitPauliConfig;
use crate::stream::RandomStream;

/// A sampled single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pauli {
    /// Identity (no error).
    I,
    /// Bit flip.
    X,
    /// Bit and phase flip.
    Y,
    /// Phase flip.
    Z,
}

/// Apply a Pauli-X to `target` in place.
pub fn apply_pauli_x(state: &mut [Complex64], target: usize) {
    let bit = 1usize << target;
    for i in 0..state.len() {
        if i & bit == 0 {
            state.swap(i, i | bit);
        }
    }
}

/// Apply a Pauli-Y to `target` in place.
pub fn apply_pauli_y(state: &mut [Complex64], target: usize) {
    let bit = 1usize << target;
    let imag = Complex64::new(0.0, 1.0);
    for i in 0..state.len() {
        if i & bit == 0 {
            let j = i | bit;
            let a0 = state[i];
            let a1 = state[j];
            state[i] = -imag * a1;
            state[j] = imag * a0;
        }
    }
}

/// Apply a Pauli-Z to `target` in place.
pub fn apply_pauli_z(state: &mut [Complex64], target: usize) {
    let bit = 1usize << target;
    for (i, amp) in state.iter_mut().enumerate() {
        if i & bit != 0 {
            *amp = -*amp;
        }
    }
}

/// Apply a sampled Pauli to `target`; identity is a no-op.
pub fn apply_pauli(pauli: Pauli, state: &mut [Complex64], target: usize) {
    match pauli {
        Pauli::I => {}
        Pauli::X => apply_pauli_x(state, target),
        Pauli::Y => apply_pauli_y(state, target),
        Pauli::Z => apply_pauli_z(state, target),
    }
}

/// Sample X/Y/Z by the cumulative `px`/`py`/`pz` probabilities; identity
/// otherwise. Draws one fresh sample per call.
pub fn sample_pauli(cfg: &SingleQubitPauliConfig, rng: &mut dyn RandomStream) -> Pauli {
    if cfg.total() <= 0.0 {
        return Pauli::I;
    }
    let r = rng.uniform(0.0, 1.0);
    if r < cfg.px {
        Pauli::X
    } else if r < cfg.px + cfg.py {
        Pauli::Y
    } else if r < cfg.px + cfg.py + cfg.pz {
        Pauli::Z
    } else {
        Pauli::I
    }
}

/// Draw a phase angle uniformly from `[-magnitude, +magnitude]`.
pub fn sample_phase_angle(magnitude: f64, rng: &mut dyn RandomStream) -> f64 {
    if magnitude <= 0.0 {
        return 0.0;
    }
    let r = rng.uniform(0.0, 1.0);
    (2.0 * r - 1.0) * magnitude
}

/// Apply `diag(e^{-iθ/2}, e^{+iθ/2})` on `target` in place.
pub fn apply_phase_rotation(state: &mut [Complex64], target: usize, theta: f64) {
    if theta == 0.0 {
        return;
    }
    let bit = 1usize << target;
    let half = 0.5 * theta;
    let phase0 = Complex64::from_polar(1.0, -half);
    let phase1 = Complex64::from_polar(1.0, half);
    for (i, amp) in state.iter_mut().enumerate() {
        if i & bit == 0 {
            *amp *= phase0;
        } else {
            *amp *= phase1;
        }
    }
}
