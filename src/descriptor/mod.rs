//! Descriptor data model, decoded from the bundle's JSON files.
//!
//! Platform variants are explicit: [`ConfigDescriptor`] and
//! [`RuntimeDescriptor`] hold either the generic descriptor or the Linux one,
//! and [`Target`] is the tag validators dispatch on.

use std::{fmt, path::Path};

use serde::{Deserialize, Deserializer};

use crate::error::LoadError;
use crate::fs_guard;

pub mod config;
pub mod runtime;
pub mod state;

pub use config::{LinuxConfig, LinuxSpec, MountPoint, Spec};
pub use runtime::{Device, LinuxRuntime, LinuxRuntimeSpec, Mount, Namespace, Rlimit, RuntimeSpec};
pub use state::State;

/// Decodes an explicit `null` as the type's default. Writers that emit nil
/// lists and maps as `null` then read the same as ones that omit the field.
pub(crate) fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Which descriptor variant applies to a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Generic,
    Linux,
}

impl Target {
    /// Maps `platform.os` to a target. An empty OS cannot be detected.
    pub fn from_os(os: &str) -> Option<Self> {
        match os {
            "" => None,
            "linux" => Some(Target::Linux),
            _ => Some(Target::Generic),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Target::Generic => "generic",
            Target::Linux => "linux",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum ConfigDescriptor {
    Generic(Spec),
    Linux(LinuxSpec),
}

impl ConfigDescriptor {
    /// Reads `config.json`, choosing the variant from its `platform.os`.
    /// An undetectable OS decodes as the generic variant.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let document = fs_guard::load_document(path)?;
        let spec: Spec = fs_guard::decode(path, document.clone())?;
        match Target::from_os(&spec.platform.os) {
            Some(Target::Linux) => Ok(Self::Linux(fs_guard::decode(path, document)?)),
            _ => Ok(Self::Generic(spec)),
        }
    }

    pub fn spec(&self) -> &Spec {
        match self {
            Self::Generic(s) => s,
            Self::Linux(ls) => &ls.spec,
        }
    }

    pub fn target(&self) -> Option<Target> {
        Target::from_os(&self.spec().platform.os)
    }
}

#[derive(Debug, Clone)]
pub enum RuntimeDescriptor {
    Generic(RuntimeSpec),
    Linux(LinuxRuntimeSpec),
}

impl RuntimeDescriptor {
    /// Reads `runtime.json` as the variant for `target`.
    pub fn load(path: &Path, target: Target) -> Result<Self, LoadError> {
        match target {
            Target::Linux => Ok(Self::Linux(fs_guard::load_descriptor(path)?)),
            Target::Generic => Ok(Self::Generic(fs_guard::load_descriptor(path)?)),
        }
    }

    pub fn runtime(&self) -> &RuntimeSpec {
        match self {
            Self::Generic(rt) => rt,
            Self::Linux(lrt) => &lrt.runtime,
        }
    }

    pub fn linux(&self) -> Option<&LinuxRuntime> {
        match self {
            Self::Generic(_) => None,
            Self::Linux(lrt) => Some(&lrt.linux),
        }
    }
}
