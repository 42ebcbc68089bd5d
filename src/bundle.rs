//! Bundle orchestration: filesystem shape, OS detection, then the config and
//! runtime composites over the decoded descriptors.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::composite::{self, Context};
use crate::descriptor::{ConfigDescriptor, RuntimeDescriptor, Spec, State, Target};
use crate::error::LoadError;
use crate::fs_guard;
use crate::outcome::Outcome;
use crate::policy::ValidationPolicy;
use crate::schema;
use crate::semantic;

pub const CONFIG_FILE: &str = "config.json";
pub const RUNTIME_FILE: &str = "runtime.json";
pub const ROOTFS_DIR: &str = "rootfs";

const OS_UNDETECTED: &str =
    "Cannot detect OS in the config.json under the bundle, or maybe miss `config.json`.";

fn load_failure(err: &LoadError) -> Outcome {
    warn!(error = %err, "descriptor could not be loaded");
    Outcome::fail(err.to_string())
}

/// The bundle must be a directory holding both descriptors and a rootfs
/// directory. Every missing item gets its own message.
pub fn files_valid(bundle: &Path) -> Outcome {
    match std::fs::metadata(bundle) {
        Err(e) => return Outcome::fail(format!("Error accessing bundle: {e}")),
        Ok(meta) if !meta.is_dir() => {
            return Outcome::fail(format!(
                "Given path {} is not a directory",
                bundle.display()
            ))
        }
        Ok(_) => {}
    }

    let mut out = Outcome::pass();
    for file in [CONFIG_FILE, RUNTIME_FILE] {
        if let Err(e) = std::fs::metadata(bundle.join(file)) {
            out.push(format!("Error accessing {file}: {e}"));
        }
    }
    let rootfs = bundle.join(ROOTFS_DIR);
    match std::fs::metadata(&rootfs) {
        Err(e) => out.push(format!("Error accessing {ROOTFS_DIR}: {e}")),
        Ok(meta) if !meta.is_dir() => out.push(format!(
            "Given path {} is not a directory",
            rootfs.display()
        )),
        Ok(_) => {}
    }
    out
}

/// Reads `platform.os` from a bundle directory or a config file directly.
/// `None` when the config cannot be read or names no OS.
pub fn detect_os(input: &Path) -> Option<Target> {
    let config = if input.is_dir() {
        input.join(CONFIG_FILE)
    } else {
        input.to_path_buf()
    };
    let spec: Spec = fs_guard::load_descriptor(&config).ok()?;
    Target::from_os(&spec.platform.os)
}

fn config_outcome(path: &Path, ctx: &Context<'_>) -> Outcome {
    debug!(path = %path.display(), "validating config");
    let config = match ConfigDescriptor::load(path) {
        Ok(c) => c,
        Err(e) => return load_failure(&e),
    };
    if config.target().is_none() {
        return Outcome::fail(OS_UNDETECTED);
    }
    composite::config_valid(&config, ctx)
}

/// Validates `config.json` on its own. Without a runtime descriptor the
/// mount cross-reference does not run.
pub fn validate_config(path: &Path, policy: &ValidationPolicy) -> Outcome {
    config_outcome(path, &Context::standalone(policy))
}

/// Validates `runtime.json` as the descriptor for `os`. The AppArmor profile
/// is only looked up when `rootfs` is given.
pub fn validate_runtime(
    path: &Path,
    os: &str,
    rootfs: Option<&Path>,
    policy: &ValidationPolicy,
) -> Outcome {
    debug!(path = %path.display(), os, "validating runtime");
    let Some(target) = Target::from_os(os) else {
        return Outcome::fail("The OS of runtime.json should not be empty");
    };
    let runtime = match RuntimeDescriptor::load(path, target) {
        Ok(rt) => rt,
        Err(e) => return load_failure(&e),
    };
    let ctx = Context {
        rootfs,
        runtime: None,
        policy,
    };
    composite::runtime_valid(&runtime, &ctx)
}

/// Full bundle check. A failed filesystem check skips everything else.
pub fn validate_bundle(bundle: &Path, policy: &ValidationPolicy) -> Outcome {
    debug!(bundle = %bundle.display(), "validating bundle");
    let mut out = files_valid(bundle);
    if !out.passed {
        debug!(messages = out.messages.len(), "bundle layout incomplete");
        return out;
    }

    let Some(target) = detect_os(bundle) else {
        out.push(OS_UNDETECTED);
        return out;
    };
    debug!(%target, "detected target");

    let rootfs: PathBuf = bundle.join(ROOTFS_DIR);
    let runtime_path = bundle.join(RUNTIME_FILE);
    let runtime = RuntimeDescriptor::load(&runtime_path, target);
    let ctx = Context {
        rootfs: Some(&rootfs),
        runtime: runtime.as_ref().ok(),
        policy,
    };

    out.absorb(config_outcome(&bundle.join(CONFIG_FILE), &ctx));
    debug!(path = %runtime_path.display(), "validating runtime");
    out.absorb(match &runtime {
        Ok(rt) => composite::runtime_valid(rt, &ctx),
        Err(e) => load_failure(e),
    });
    out
}

/// Validates a container's `state.json`.
pub fn validate_state(path: &Path) -> Outcome {
    debug!(path = %path.display(), "validating state");
    let state: State = match fs_guard::load_descriptor(path) {
        Ok(s) => s,
        Err(e) => return load_failure(&e),
    };
    let mut out = schema::walk(&state, "State");
    if !state.version.is_empty() {
        out.absorb(semantic::check_version(&state.version));
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    const CONFIG: &str = r#"{
        "version": "0.3.0",
        "platform": {"os": "linux", "arch": "amd64"},
        "process": {"user": {"uid": 0, "gid": 0}, "args": ["sh"]},
        "root": {"path": "rootfs"},
        "mounts": [
            {"name": "proc", "path": "/proc"},
            {"name": "sys", "path": "/sys"}
        ],
        "linux": {"capabilities": ["CAP_KILL"]}
    }"#;

    const RUNTIME: &str = r#"{
        "mounts": {
            "proc": {"type": "proc", "source": "proc"},
            "sys": {"type": "sysfs", "source": "sysfs"}
        },
        "linux": {
            "namespaces": [{"type": "pid"}, {"type": "mount"}],
            "devices": [
                {"path": "/dev/null", "type": "c", "major": 1, "minor": 3},
                {"path": "/dev/zero", "type": "c", "major": 1, "minor": 5},
                {"path": "/dev/full", "type": "c", "major": 1, "minor": 7},
                {"path": "/dev/random", "type": "c", "major": 1, "minor": 8},
                {"path": "/dev/urandom", "type": "c", "major": 1, "minor": 9},
                {"path": "/dev/tty", "type": "c", "major": 5, "minor": 0},
                {"path": "/dev/console", "type": "c", "major": 5, "minor": 1}
            ]
        }
    }"#;

    fn bundle(config: &str, runtime: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), config).unwrap();
        fs::write(dir.path().join(RUNTIME_FILE), runtime).unwrap();
        fs::create_dir_all(dir.path().join("rootfs/proc")).unwrap();
        fs::create_dir_all(dir.path().join("rootfs/sys")).unwrap();
        dir
    }

    #[test]
    fn valid_bundle_passes() {
        let dir = bundle(CONFIG, RUNTIME);
        let out = validate_bundle(dir.path(), &ValidationPolicy::default());
        assert!(out.passed, "{:?}", out.messages);
    }

    #[test]
    fn explicit_null_lists_are_accepted() {
        let config = CONFIG
            .replace(r#""gid": 0}"#, r#""gid": 0, "additionalGids": null}"#)
            .replace(r#"["sh"]"#, r#"["sh"], "env": null"#);
        let runtime = RUNTIME.replace(
            r#""namespaces""#,
            r#""uidMappings": null, "sysctl": null, "seccomp": null, "namespaces""#,
        );
        let dir = bundle(&config, &runtime);
        let out = validate_bundle(dir.path(), &ValidationPolicy::default());
        assert!(out.passed, "{:?}", out.messages);
    }

    #[test]
    fn files_valid_reports_each_missing_item() {
        let dir = tempfile::tempdir().unwrap();
        let out = files_valid(dir.path());
        assert_eq!(out.messages.len(), 3, "{:?}", out.messages);
        assert!(out.messages[0].starts_with("Error accessing config.json"));
        assert!(out.messages[1].starts_with("Error accessing runtime.json"));
        assert!(out.messages[2].starts_with("Error accessing rootfs"));
    }

    #[test]
    fn files_valid_rejects_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("not-a-bundle");
        fs::write(&f, "").unwrap();
        let out = files_valid(&f);
        assert_eq!(out.messages.len(), 1);
        assert!(out.messages[0].contains("is not a directory"));

        let out = files_valid(&dir.path().join("missing"));
        assert!(out.messages[0].starts_with("Error accessing bundle"));
    }

    #[test]
    fn missing_runtime_short_circuits() {
        let dir = bundle(r#"{"platform": {"os": "linux"}}"#, RUNTIME);
        fs::remove_file(dir.path().join(RUNTIME_FILE)).unwrap();
        let out = validate_bundle(dir.path(), &ValidationPolicy::default());
        assert!(!out.passed);
        assert_eq!(out.messages.len(), 1, "{:?}", out.messages);
        assert!(out.messages[0].contains("runtime.json"));
    }

    #[test]
    fn undetectable_os_stops_after_layout() {
        let dir = bundle(r#"{"version": "0.3.0"}"#, RUNTIME);
        let out = validate_bundle(dir.path(), &ValidationPolicy::default());
        assert_eq!(out.messages, vec![OS_UNDETECTED]);
    }

    #[test]
    fn bundle_cross_references_mounts() {
        let runtime = RUNTIME.replace(r#""proc": {"type": "proc", "source": "proc"},"#, "");
        let dir = bundle(CONFIG, &runtime);
        let out = validate_bundle(dir.path(), &ValidationPolicy::default());
        assert_eq!(
            out.messages,
            vec!["proc in config/mount does not exist in runtime/mount"]
        );
    }

    #[test]
    fn bundle_checks_mount_points_under_rootfs() {
        let dir = bundle(CONFIG, RUNTIME);
        fs::remove_dir(dir.path().join("rootfs/sys")).unwrap();
        let out = validate_bundle(dir.path(), &ValidationPolicy::default());
        assert_eq!(
            out.messages,
            vec!["The mount point sys /sys does not exist in rootfs"]
        );
    }

    #[test]
    fn bundle_reports_unreadable_runtime_once() {
        let dir = bundle(CONFIG, "{ not json");
        let out = validate_bundle(dir.path(), &ValidationPolicy::default());
        assert_eq!(out.messages.len(), 1, "{:?}", out.messages);
        assert!(out.messages[0].contains("runtime.json"));
    }

    #[test]
    fn bundle_validation_is_idempotent() {
        let dir = bundle(CONFIG, &RUNTIME.replace("\"pid\"", "\"bogus\""));
        let policy = ValidationPolicy::default();
        let first = validate_bundle(dir.path(), &policy);
        assert!(!first.passed);
        assert_eq!(first, validate_bundle(dir.path(), &policy));
    }

    #[test]
    fn detect_os_accepts_dir_or_file() {
        let dir = bundle(CONFIG, RUNTIME);
        assert_eq!(detect_os(dir.path()), Some(Target::Linux));
        assert_eq!(
            detect_os(&dir.path().join(CONFIG_FILE)),
            Some(Target::Linux)
        );
        assert_eq!(detect_os(&dir.path().join("nope")), None);
    }

    #[test]
    fn config_only_skips_cross_reference() {
        let dir = bundle(CONFIG, "{}");
        let out = validate_config(&dir.path().join(CONFIG_FILE), &ValidationPolicy::default());
        assert!(out.passed, "{:?}", out.messages);
    }

    #[test]
    fn runtime_only_uses_given_os() {
        let dir = bundle(CONFIG, RUNTIME);
        let path = dir.path().join(RUNTIME_FILE);
        let policy = ValidationPolicy::default();
        assert!(validate_runtime(&path, "linux", None, &policy).passed);
        assert!(validate_runtime(&path, "solaris", None, &policy).passed);
        assert!(!validate_runtime(&path, "", None, &policy).passed);
    }

    #[test]
    fn runtime_apparmor_profile_needs_rootfs_entry() {
        let dir = bundle(CONFIG, &RUNTIME.replace(
            r#""namespaces""#,
            r#""apparmorProfile": "docker-default", "namespaces""#,
        ));
        let path = dir.path().join(RUNTIME_FILE);
        let rootfs = dir.path().join(ROOTFS_DIR);
        let policy = ValidationPolicy::default();

        let out = validate_runtime(&path, "linux", Some(&rootfs), &policy);
        assert_eq!(out.messages, vec!["ApparmorProfile docker-default does not exist"]);

        fs::create_dir_all(rootfs.join("etc/apparmor.d")).unwrap();
        fs::write(rootfs.join("etc/apparmor.d/docker-default"), "").unwrap();
        assert!(validate_runtime(&path, "linux", Some(&rootfs), &policy).passed);
    }

    #[test]
    fn state_requires_identity_fields() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("state.json");
        fs::write(&p, r#"{"version": "0.3.0", "id": "c1", "pid": 42, "bundlePath": "/b"}"#)
            .unwrap();
        assert!(validate_state(&p).passed);

        fs::write(&p, r#"{"version": "1", "pid": 42}"#).unwrap();
        let out = validate_state(&p);
        assert_eq!(out.messages.len(), 3, "{:?}", out.messages);
        assert_eq!(out.messages[0], "State.id should not be empty.");
        assert_eq!(out.messages[1], "State.bundlePath should not be empty.");
    }
}
