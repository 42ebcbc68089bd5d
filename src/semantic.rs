//! Per-object semantic checks for descriptor values.
//!
//! Every check returns an [`Outcome`] and reports all problems it finds; an
//! invalid entry never stops its siblings from being checked.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::descriptor::config::MountPoint;
use crate::descriptor::runtime::{Arg, Device, Mount, Namespace, Rlimit, Seccomp, Syscall};
use crate::enums::{
    Capability, ClosedSet, DeviceType, NamespaceType, RlimitType, RootfsPropagation,
    SeccompAction, SeccompArch, SeccompOperator, REQUIRED_DEVICES, REQUIRED_PATHS,
};
use crate::outcome::Outcome;

fn semver() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"^\d*\.\d*\.\d*$").expect("static pattern compiles"))
}

/// `value` must be a member of `E`. `subject` prefixes the message.
fn member<E: ClosedSet>(subject: &str, value: &str) -> Outcome {
    match E::lookup(value) {
        Some(_) => Outcome::pass(),
        None => Outcome::fail(format!(
            "{subject} {value:?} is not a valid {}, expected one of {}",
            E::LABEL,
            E::choices()
        )),
    }
}

/// Three dot-separated, optionally empty digit groups.
pub fn check_version(version: &str) -> Outcome {
    if semver().is_match(version) {
        Outcome::pass()
    } else {
        Outcome::fail(format!(
            "{version} is not a valid version format, please read 'SemVer v2.0.0'"
        ))
    }
}

pub fn check_namespace(ns: &Namespace) -> Outcome {
    if ns.kind.is_empty() {
        return Outcome::fail("The type of the namespace should not be empty");
    }
    if NamespaceType::from_id(&ns.kind).is_none() {
        return Outcome::fail(format!(
            "The type of the namespace {:?} should be one of {}",
            ns.kind,
            NamespaceType::choices()
        ));
    }
    Outcome::pass()
}

/// Only the limit name is checked; soft and hard are taken as given.
pub fn check_rlimit(r: &Rlimit) -> Outcome {
    member::<RlimitType>("Rlimit", &r.kind)
}

pub fn check_device(d: &Device) -> Outcome {
    let Some(kind) = DeviceType::from_id(&d.kind) else {
        return Outcome::fail(format!(
            "Device {} type {:?} should be one of `{}`",
            d.path,
            d.kind,
            DeviceType::choices()
        ));
    };
    let mut out = Outcome::pass();
    if kind.has_numbers() {
        if d.major <= 0 {
            out.push(format!(
                "Device {} type is `b/c/u`, please set the major number",
                d.path
            ));
        }
        if d.minor < 0 {
            out.push(format!(
                "Device {} type is `b/c/u`, the minor number must not be negative",
                d.path
            ));
        }
    } else if d.major != 0 || d.minor != 0 {
        out.push(format!(
            "Device {} type is `p`, no need to set major/minor number",
            d.path
        ));
    }
    out
}

pub fn check_seccomp(s: &Seccomp) -> Outcome {
    let mut out = member::<SeccompAction>("Seccomp.defaultAction", &s.default_action);
    for arch in &s.architectures {
        out.absorb(member::<SeccompArch>("Seccomp.architectures", arch));
    }
    for sc in &s.syscalls {
        out.absorb(check_syscall(sc));
    }
    out
}

pub fn check_syscall(sc: &Syscall) -> Outcome {
    let mut out = member::<SeccompAction>(&format!("Syscall {} action", sc.name), &sc.action);
    for arg in &sc.args {
        out.absorb(check_arg(&sc.name, arg));
    }
    out
}

pub fn check_arg(syscall: &str, arg: &Arg) -> Outcome {
    member::<SeccompOperator>(
        &format!("Syscall {syscall} arg {} operator", arg.index),
        &arg.op,
    )
}

pub fn check_capabilities(caps: &[String]) -> Outcome {
    caps.iter()
        .filter(|c| Capability::from_id(c).is_none())
        .map(|c| Outcome::fail(format!("{c} is not valid, please `man capabilities`")))
        .collect()
}

/// Empty means "runtime default".
pub fn check_rootfs_propagation(value: &str) -> Outcome {
    if value.is_empty() || RootfsPropagation::from_id(value).is_some() {
        return Outcome::pass();
    }
    Outcome::fail(format!(
        "RootfsPropagation {value:?} should be one of {}",
        RootfsPropagation::choices()
    ))
}

/// `which` is "UID" or "GID".
pub fn check_id_mappings(which: &str, count: usize, max: usize) -> Outcome {
    if count > max {
        Outcome::fail(format!("The {which} mapping is limited to {max}"))
    } else {
        Outcome::pass()
    }
}

/// Resolves a descriptor path, absolute or not, inside `rootfs`. The path is
/// normalized lexically; `None` when a `..` would climb above `rootfs`.
fn under(rootfs: &Path, path: &str) -> Option<PathBuf> {
    let mut rel = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::ParentDir => {
                if !rel.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    Some(rootfs.join(rel))
}

/// The mount point's path must be a directory inside `rootfs`.
pub fn check_mount_point(mp: &MountPoint, rootfs: &Path) -> Outcome {
    let meta = under(rootfs, &mp.path).map(std::fs::metadata);
    match meta {
        None | Some(Err(_)) => Outcome::fail(format!(
            "The mount point {} {} does not exist in rootfs",
            mp.name, mp.path
        )),
        Some(Ok(meta)) if !meta.is_dir() => Outcome::fail(format!(
            "The mount point {} {} is not a valid directory",
            mp.name, mp.path
        )),
        Some(Ok(_)) => Outcome::pass(),
    }
}

/// Cross-references config mount points with runtime mounts. Per entry the
/// rootfs check, the runtime lookup and the duplicate check all run.
pub fn check_mount_points(
    mps: &[MountPoint],
    mounts: &BTreeMap<String, Mount>,
    rootfs: &Path,
) -> Outcome {
    let mut out = Outcome::pass();
    for (i, mp) in mps.iter().enumerate() {
        out.absorb(check_mount_point(mp, rootfs));
        if !mounts.contains_key(&mp.name) {
            out.push(format!(
                "{} in config/mount does not exist in runtime/mount",
                mp.name
            ));
        }
        if mps[..i].iter().any(|earlier| earlier.name == mp.name) {
            out.push(format!("{} in config/mount is duplicated", mp.name));
        }
    }
    out
}

/// Every platform path must be declared as a mount point.
pub fn check_required_paths(mps: &[MountPoint]) -> Outcome {
    REQUIRED_PATHS
        .iter()
        .filter(|p| !mps.iter().any(|mp| mp.path == **p))
        .map(|p| Outcome::fail(format!("The mount {p} is missing")))
        .collect()
}

/// Every platform device node must be declared.
pub fn check_required_devices(devices: &[Device]) -> Outcome {
    REQUIRED_DEVICES
        .iter()
        .filter(|p| !devices.iter().any(|d| d.path == **p))
        .map(|p| Outcome::fail(format!("The required device {p} is missing")))
        .collect()
}

/// Checked only when both a profile and a rootfs are known.
pub fn check_apparmor_profile(profile: &str, rootfs: Option<&Path>) -> Outcome {
    let Some(rootfs) = rootfs else {
        return Outcome::pass();
    };
    if profile.is_empty() {
        return Outcome::pass();
    }
    let found = under(rootfs, &format!("etc/apparmor.d/{profile}"))
        .filter(|p| p.starts_with(rootfs.join("etc/apparmor.d")))
        .is_some_and(|p| p.is_file());
    if found {
        return Outcome::pass();
    }
    Outcome::fail(format!("ApparmorProfile {profile} does not exist"))
}
