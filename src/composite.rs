//! Whole-descriptor validators: the required-field walk followed by the
//! semantic checks, dispatched on the descriptor's platform variant.

use std::path::Path;

use crate::descriptor::{
    ConfigDescriptor, LinuxRuntimeSpec, LinuxSpec, RuntimeDescriptor, RuntimeSpec, Spec,
};
use crate::outcome::Outcome;
use crate::policy::ValidationPolicy;
use crate::schema;
use crate::semantic;

/// What a composite validator may cross-reference besides its own file.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// Container root filesystem, when validating inside a bundle.
    pub rootfs: Option<&'a Path>,
    /// The decoded runtime descriptor, for the mount cross-reference.
    pub runtime: Option<&'a RuntimeDescriptor>,
    pub policy: &'a ValidationPolicy,
}

impl<'a> Context<'a> {
    /// A context with nothing to cross-reference.
    pub fn standalone(policy: &'a ValidationPolicy) -> Self {
        Self {
            rootfs: None,
            runtime: None,
            policy,
        }
    }
}

pub fn config_valid(config: &ConfigDescriptor, ctx: &Context<'_>) -> Outcome {
    match config {
        ConfigDescriptor::Generic(s) => {
            let mut out = schema::walk(s, "Spec");
            out.absorb(spec_valid(s, ctx));
            out
        }
        ConfigDescriptor::Linux(ls) => {
            let mut out = schema::walk(ls, "LinuxSpec");
            out.absorb(linux_spec_valid(ls, ctx));
            out
        }
    }
}

pub fn runtime_valid(runtime: &RuntimeDescriptor, ctx: &Context<'_>) -> Outcome {
    match runtime {
        RuntimeDescriptor::Generic(rt) => {
            let mut out = schema::walk(rt, "RuntimeSpec");
            out.absorb(runtime_spec_valid(rt, ctx));
            out
        }
        RuntimeDescriptor::Linux(lrt) => {
            let mut out = schema::walk(lrt, "LinuxRuntimeSpec");
            out.absorb(linux_runtime_spec_valid(lrt, ctx));
            out
        }
    }
}

/// Version shape, and the mount cross-reference when both a rootfs and a
/// runtime descriptor are available.
pub fn spec_valid(s: &Spec, ctx: &Context<'_>) -> Outcome {
    let mut out = Outcome::pass();
    if !s.version.is_empty() {
        out.absorb(semantic::check_version(&s.version));
    }
    if let (Some(rootfs), Some(runtime)) = (ctx.rootfs, ctx.runtime) {
        out.absorb(semantic::check_mount_points(
            &s.mounts,
            &runtime.runtime().mounts,
            rootfs,
        ));
    }
    out
}

pub fn linux_spec_valid(ls: &LinuxSpec, ctx: &Context<'_>) -> Outcome {
    let mut out = spec_valid(&ls.spec, ctx);
    if ctx.policy.require_platform_mounts {
        out.absorb(semantic::check_required_paths(&ls.spec.mounts));
    }
    out.absorb(semantic::check_capabilities(&ls.linux.capabilities));
    out.absorb(semantic::check_rootfs_propagation(
        &ls.linux.rootfs_propagation,
    ));
    out
}

/// The generic runtime carries no constraints beyond its required fields.
pub fn runtime_spec_valid(_rt: &RuntimeSpec, _ctx: &Context<'_>) -> Outcome {
    Outcome::pass()
}

pub fn linux_runtime_spec_valid(lrt: &LinuxRuntimeSpec, ctx: &Context<'_>) -> Outcome {
    let mut out = runtime_spec_valid(&lrt.runtime, ctx);
    let lr = &lrt.linux;
    let max = ctx.policy.max_id_mappings;

    out.absorb(semantic::check_id_mappings("UID", lr.uid_mappings.len(), max));
    out.absorb(semantic::check_id_mappings("GID", lr.gid_mappings.len(), max));
    out.absorb(lr.rlimits.iter().map(semantic::check_rlimit).collect());
    out.absorb(lr.namespaces.iter().map(semantic::check_namespace).collect());
    if ctx.policy.require_platform_devices {
        out.absorb(semantic::check_required_devices(&lr.devices));
    }
    out.absorb(lr.devices.iter().map(semantic::check_device).collect());
    if ctx.policy.check_apparmor_profile {
        out.absorb(semantic::check_apparmor_profile(
            &lr.apparmor_profile,
            ctx.rootfs,
        ));
    }
    if let Some(seccomp) = &lr.seccomp {
        out.absorb(semantic::check_seccomp(seccomp));
    }
    out.absorb(semantic::check_rootfs_propagation(&lr.rootfs_propagation));
    out
}
