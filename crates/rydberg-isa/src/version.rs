//! ISA version identifiers.

use serde::{Deserialize, Serialize};

/// A `major.minor` ISA version pair.
///
/// Version 1.0 is the legacy 1-D geometry view; 1.1 adds the lattice,
/// timing, and pulse extensions on [`crate::HardwareConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IsaVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

/// The ISA version this crate was written against.
pub const CURRENT_ISA_VERSION: IsaVersion = IsaVersion { major: 1, minor: 1 };

/// All versions the runtime accepts.
pub const SUPPORTED_ISA_VERSIONS: [IsaVersion; 2] = [
    IsaVersion { major: 1, minor: 0 },
    IsaVersion { major: 1, minor: 1 },
];

impl IsaVersion {
    /// Create a version pair.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Check whether this version appears in [`SUPPORTED_ISA_VERSIONS`].
    pub fn is_supported(&self) -> bool {
        SUPPORTED_ISA_VERSIONS.contains(self)
    }
}

impl Default for IsaVersion {
    fn default() -> Self {
        CURRENT_ISA_VERSION
    }
}

impl std::fmt::Display for IsaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Comma-separated list of supported versions, for error messages.
pub fn supported_versions_string() -> String {
    SUPPORTED_ISA_VERSIONS
        .iter()
        .map(IsaVersion::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
