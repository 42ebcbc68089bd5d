//! Integration tests for the bundlecheck binary.
//!
//! These tests invoke the `bundlecheck` binary end-to-end, verifying the
//! printed verdict, the exit status and the report file for bundles built in
//! temporary directories and for the demo bundle shipped with the crate.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Returns the path to the compiled `bundlecheck` binary.
fn bundlecheck_bin() -> PathBuf {
    if let Some(p) = std::env::var_os("CARGO_BIN_EXE_bundlecheck") {
        PathBuf::from(p)
    } else {
        let mut path = std::env::current_exe()
            .expect("cannot determine test binary path")
            .parent()
            .expect("no parent directory")
            .parent()
            .expect("no grandparent directory")
            .to_path_buf();
        path.push("bundlecheck");
        path
    }
}

fn demo_bundle() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/minimal-bundle")
}

fn run(args: &[&str]) -> Output {
    Command::new(bundlecheck_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run bundlecheck")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

/// Copies the demo bundle into a temp directory so tests can break it.
fn copy_demo(dir: &Path) {
    let demo = demo_bundle();
    fs::copy(demo.join("config.json"), dir.join("config.json")).unwrap();
    fs::copy(demo.join("runtime.json"), dir.join("runtime.json")).unwrap();
    fs::create_dir_all(dir.join("rootfs/proc")).unwrap();
    fs::create_dir_all(dir.join("rootfs/sys")).unwrap();
}

fn edit_json(path: &Path, f: impl FnOnce(&mut serde_json::Value)) {
    let mut v: serde_json::Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
    f(&mut v);
    fs::write(path, serde_json::to_vec_pretty(&v).unwrap()).unwrap();
}

// -------------------------------------------------------------------------
// Happy-path tests
// -------------------------------------------------------------------------

#[test]
fn test_demo_bundle_is_valid() {
    let demo = demo_bundle();
    let out = run(&["bundle", demo.to_str().unwrap()]);
    assert!(
        out.status.success(),
        "demo bundle should pass.\nstdout: {}\nstderr: {}",
        stdout(&out),
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(stdout(&out).trim(), "The bundle is valid!");
}

#[test]
fn test_aliases_dispatch_to_the_same_commands() {
    let demo = demo_bundle();
    let config = demo.join("config.json");
    let runtime = demo.join("runtime.json");

    let out = run(&["vb", demo.to_str().unwrap()]);
    assert!(out.status.success());

    let out = run(&["vc", config.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "The config.json is valid!");

    let out = run(&["vr", runtime.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "The runtime.json is valid!");
}

#[test]
fn test_state_command() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("state.json");
    fs::write(
        &state,
        r#"{"version": "0.3.0", "id": "demo", "pid": 4242, "bundlePath": "/containers/demo"}"#,
    )
    .unwrap();
    let out = run(&["state", state.to_str().unwrap()]);
    assert!(out.status.success(), "stdout: {}", stdout(&out));
    assert_eq!(stdout(&out).trim(), "The state.json is valid!");
}

#[test]
fn test_report_written_for_passing_bundle() {
    let dir = TempDir::new().unwrap();
    copy_demo(dir.path());
    let report_path = dir.path().join("report.json");

    let out = run(&[
        "bundle",
        dir.path().to_str().unwrap(),
        "--report",
        report_path.to_str().unwrap(),
    ]);
    assert!(out.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&fs::read(&report_path).unwrap()).unwrap();
    assert_eq!(report["result"], "PASS");
    assert_eq!(report["subject"], "bundle");
    assert_eq!(report["target"], "linux");
    assert!(report["failures"].as_array().unwrap().is_empty());

    let descriptors = report["descriptors"].as_array().unwrap();
    assert_eq!(descriptors.len(), 2);
    for d in descriptors {
        let sha = d["sha256"].as_str().unwrap();
        assert_eq!(sha.len(), 64, "sha256 should be 64 hex chars");
        assert!(sha.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

// -------------------------------------------------------------------------
// Failure tests
// -------------------------------------------------------------------------

#[test]
fn test_missing_runtime_short_circuits() {
    let dir = TempDir::new().unwrap();
    copy_demo(dir.path());
    fs::remove_file(dir.path().join("runtime.json")).unwrap();

    let out = run(&["bundle", dir.path().to_str().unwrap()]);
    assert!(!out.status.success(), "missing runtime.json should fail");

    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "The bundle is not valid, details errors:");
    assert_eq!(lines.len(), 2, "only the layout message expected: {text}");
    assert!(lines[1].starts_with("Error accessing runtime.json"));
}

#[test]
fn test_semantic_errors_are_all_reported() {
    let dir = TempDir::new().unwrap();
    copy_demo(dir.path());
    edit_json(&dir.path().join("config.json"), |v| {
        v["version"] = "v1.0".into();
        v["linux"]["capabilities"] = serde_json::json!(["CAP_NOT_REAL"]);
    });
    edit_json(&dir.path().join("runtime.json"), |v| {
        v["linux"]["namespaces"][0]["type"] = "bogus".into();
    });

    let out = run(&["bundle", dir.path().to_str().unwrap()]);
    assert!(!out.status.success());
    let text = stdout(&out);
    assert!(text.contains("v1.0 is not a valid version format"), "{text}");
    assert!(text.contains("CAP_NOT_REAL is not valid"), "{text}");
    assert!(text.contains("\"bogus\""), "{text}");
}

#[test]
fn test_cross_reference_failure_in_report() {
    let dir = TempDir::new().unwrap();
    copy_demo(dir.path());
    edit_json(&dir.path().join("runtime.json"), |v| {
        v["mounts"].as_object_mut().unwrap().remove("proc");
    });
    let report_path = dir.path().join("report.json");

    let out = run(&[
        "bundle",
        dir.path().to_str().unwrap(),
        "--report",
        report_path.to_str().unwrap(),
    ]);
    assert!(!out.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&fs::read(&report_path).unwrap()).unwrap();
    assert_eq!(report["result"], "FAIL");
    assert_eq!(
        report["failures"],
        serde_json::json!(["proc in config/mount does not exist in runtime/mount"])
    );
}

#[test]
fn test_policy_inside_bundle_cannot_waive_devices() {
    let dir = TempDir::new().unwrap();
    copy_demo(dir.path());
    edit_json(&dir.path().join("runtime.json"), |v| {
        v["linux"]["devices"].as_array_mut().unwrap().truncate(1);
    });
    fs::write(
        dir.path().join("bundlecheck-policy.json"),
        r#"{"require_platform_devices": false}"#,
    )
    .unwrap();

    let out = run(&["bundle", dir.path().to_str().unwrap()]);
    assert!(!out.status.success(), "a bundle must not relax its own checks");
    assert!(stdout(&out).contains("The required device /dev/console is missing"));

    let operator = TempDir::new().unwrap();
    let policy = operator.path().join("policy.json");
    fs::write(&policy, r#"{"require_platform_devices": false}"#).unwrap();
    let out = run(&[
        "bundle",
        dir.path().to_str().unwrap(),
        "--policy",
        policy.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stdout: {}", stdout(&out));
}

#[test]
fn test_runtime_rootfs_enables_apparmor_lookup() {
    let dir = TempDir::new().unwrap();
    copy_demo(dir.path());
    let runtime = dir.path().join("runtime.json");
    edit_json(&runtime, |v| {
        v["linux"]["apparmorProfile"] = "docker-default".into();
    });

    let out = run(&["runtime", runtime.to_str().unwrap()]);
    assert!(out.status.success(), "no rootfs means no profile lookup");

    let rootfs = dir.path().join("rootfs");
    let out = run(&[
        "runtime",
        runtime.to_str().unwrap(),
        "--rootfs",
        rootfs.to_str().unwrap(),
    ]);
    assert!(!out.status.success());
    assert!(stdout(&out).contains("ApparmorProfile docker-default does not exist"));
}

#[test]
fn test_unparseable_config_is_one_message() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{ not json").unwrap();

    let out = run(&["config", config.to_str().unwrap()]);
    assert!(!out.status.success());
    let text = stdout(&out);
    assert_eq!(text.lines().count(), 2, "{text}");
    assert!(text.contains("cannot parse"), "{text}");
}

#[test]
fn test_explicit_missing_policy_is_an_error() {
    let demo = demo_bundle();
    let out = run(&[
        "bundle",
        demo.to_str().unwrap(),
        "--policy",
        "/nonexistent/policy.json",
    ]);
    assert!(!out.status.success());
    assert!(stdout(&out).is_empty(), "no verdict without a policy");
}
