//! # bundlecheck -- container bundle validator
//!
//! Checks that a container bundle (a `config.json`, a `runtime.json` and a
//! `rootfs/` directory) describes a container a runtime could start: required
//! fields are filled in, enumerated values come from the known sets, and the
//! two descriptors agree with each other and with the root filesystem.
//!
//! Validation never stops at the first problem. Every check returns an
//! [`outcome::Outcome`] holding human-readable messages, and callers merge
//! them into one report with a single verdict.
//!
//! ## Security Properties
//!
//! - **`#![forbid(unsafe_code)]`**: No `unsafe` blocks anywhere.
//! - **Read-only**: Validation only reads descriptors and stats the rootfs.
//! - **Defensive input handling**: Descriptor reads are symlink-checked and
//!   size-bounded via [`fs_guard::read_validated`].
//! - **Linear-time regex**: The `regex` crate guarantees no catastrophic
//!   backtracking on the version check.
//!
//! ## Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`fs_guard`] | Symlink-safe, size-bounded descriptor reads |
//! | [`descriptor`] | Config, runtime and state data model |
//! | [`schema`] | Required-field walker |
//! | [`enums`] | Closed value sets (capabilities, rlimits, seccomp, ...) |
//! | [`semantic`] | Per-object rules and cross-references |
//! | [`composite`] | Whole-descriptor validators per platform |
//! | [`bundle`] | Bundle orchestration |
//! | [`policy`] | Policy loading and secure defaults |
//! | [`report`] | JSON verification report |

#![forbid(unsafe_code)]

/// Validation result type shared by every checker.
pub mod outcome;

/// Typed errors for reading and decoding descriptor files.
pub mod error;

/// Symlink-safe, size-bounded file reads. Single source of truth for all
/// descriptor I/O.
pub mod fs_guard;

/// Descriptor data model with explicit generic and Linux variants.
pub mod descriptor;

/// Required-field walking driven by per-type field listings.
pub mod schema;

/// Closed enumerations and their membership predicates.
pub mod enums;

pub mod semantic;

pub mod composite;

/// Bundle layout checks, OS detection and the top-level validators.
pub mod bundle;

/// Policy model: loads an operator-supplied policy file and provides secure defaults
/// for the platform checks.
pub mod policy;

/// Verification report with descriptor digests.
pub mod report;

pub use outcome::Outcome;
