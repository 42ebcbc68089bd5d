use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum policy file size (1 MB).
const MAX_POLICY_BYTES: u64 = 1024 * 1024;

/// Knobs for the Linux platform checks. Defaults enforce everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Upper bound on UID and on GID mappings.
    pub max_id_mappings: usize,
    /// `/proc` and `/sys` must be declared as config mount points.
    pub require_platform_mounts: bool,
    /// The standard device nodes must be declared in the runtime.
    pub require_platform_devices: bool,
    /// The AppArmor profile must exist under the rootfs.
    pub check_apparmor_profile: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_id_mappings: 5,
            require_platform_mounts: true,
            require_platform_devices: true,
            check_apparmor_profile: true,
        }
    }
}

impl ValidationPolicy {
    /// Loads an operator-supplied policy. Policies are never read from the
    /// bundle under validation, so a bundle cannot relax its own checks.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let bytes = crate::fs_guard::read_validated(p, MAX_POLICY_BYTES)?;
                serde_json::from_slice(&bytes)
                    .with_context(|| format!("parsing policy {}", p.display()))
            }
            None => Ok(Self::default()),
        }
    }
}
