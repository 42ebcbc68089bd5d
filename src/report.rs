use anyhow::{Context, Result};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::{fs, path::Path};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::descriptor::Target;
use crate::fs_guard::{self, MAX_DESCRIPTOR_BYTES};
use crate::outcome::Outcome;

pub const REPORT_SCHEMA: &str = "bundlecheck/report/v1";

/// One descriptor entry. The file is read through the same symlink and size
/// guard as validation, so the digest covers exactly the bytes that were
/// checked.
fn digest_entry(p: &Path, max_bytes: u64) -> Result<Value> {
    let bytes = fs_guard::read_validated(p, max_bytes)?;
    Ok(json!({
        "path": p.display().to_string(),
        "sha256": hex::encode(Sha256::digest(&bytes)),
        "bytes": bytes.len()
    }))
}

/// Digests of the descriptors that were validated. Files that do not exist
/// are left out; the outcome already says they are missing.
pub fn digest_descriptors(paths: &[&Path]) -> Result<Vec<Value>> {
    paths
        .iter()
        .filter(|p| p.is_file())
        .map(|p| digest_entry(p, MAX_DESCRIPTOR_BYTES))
        .collect()
}

pub fn build_report(
    subject: &str,
    path: &Path,
    target: Option<Target>,
    outcome: &Outcome,
    descriptors: &[&Path],
) -> Result<Value> {
    let now = OffsetDateTime::now_utc().format(&Rfc3339)?;
    let result = if outcome.passed { "PASS" } else { "FAIL" };
    Ok(json!({
        "report_schema": REPORT_SCHEMA,
        "bundlecheck_version": env!("CARGO_PKG_VERSION"),
        "subject": subject,
        "path": path.display().to_string(),
        "target": target.map(Target::as_str),
        "checked_at": now,
        "result": result,
        "failures": outcome.messages,
        "descriptors": digest_descriptors(descriptors)?,
    }))
}

pub fn write_report(dest: &Path, report: &Value) -> Result<()> {
    fs::write(dest, serde_json::to_vec_pretty(report)?)
        .with_context(|| format!("writing report {}", dest.display()))
}
