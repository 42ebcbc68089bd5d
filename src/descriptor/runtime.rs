//! Runtime descriptor (`runtime.json`).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use super::null_as_default;
use crate::schema::{Field, Schema};

/// Platform-independent runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeSpec {
    /// Mount mechanics keyed by the mount-point name used in `config.json`.
    #[serde(deserialize_with = "null_as_default")]
    pub mounts: BTreeMap<String, Mount>,
    pub hooks: Option<Hooks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Mount {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub options: Vec<String>,
}

/// Commands run at lifecycle events of the container.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Hooks {
    #[serde(deserialize_with = "null_as_default")]
    pub prestart: Vec<Hook>,
    #[serde(deserialize_with = "null_as_default")]
    pub poststart: Vec<Hook>,
    #[serde(deserialize_with = "null_as_default")]
    pub poststop: Vec<Hook>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Hook {
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub args: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub env: Vec<String>,
}

/// Runtime configuration for Linux containers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinuxRuntimeSpec {
    #[serde(flatten)]
    pub runtime: RuntimeSpec,
    pub linux: LinuxRuntime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinuxRuntime {
    #[serde(deserialize_with = "null_as_default")]
    pub uid_mappings: Vec<IdMapping>,
    #[serde(deserialize_with = "null_as_default")]
    pub gid_mappings: Vec<IdMapping>,
    #[serde(deserialize_with = "null_as_default")]
    pub rlimits: Vec<Rlimit>,
    #[serde(deserialize_with = "null_as_default")]
    pub sysctl: BTreeMap<String, String>,
    pub resources: Option<Resources>,
    /// Relative to the cgroups mountpoint.
    #[serde(deserialize_with = "null_as_default")]
    pub cgroups_path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub namespaces: Vec<Namespace>,
    #[serde(deserialize_with = "null_as_default")]
    pub devices: Vec<Device>,
    #[serde(deserialize_with = "null_as_default")]
    pub apparmor_profile: String,
    #[serde(deserialize_with = "null_as_default")]
    pub selinux_process_label: String,
    pub seccomp: Option<Seccomp>,
    #[serde(deserialize_with = "null_as_default")]
    pub rootfs_propagation: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct IdMapping {
    #[serde(rename = "hostID")]
    pub host_id: u32,
    #[serde(rename = "containerID")]
    pub container_id: u32,
    pub size: u32,
}

/// A resource limit. Soft and hard values are not compared.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Rlimit {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    pub hard: u64,
    pub soft: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Namespace {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    /// Existing namespace to join instead of creating one.
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Device {
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    /// `b`, `c`, `u` or `p`; accepted as a string or as a character code.
    #[serde(rename = "type", deserialize_with = "device_type")]
    pub kind: String,
    pub major: i64,
    pub minor: i64,
    /// Cgroup permissions, `rwm`.
    #[serde(deserialize_with = "null_as_default")]
    pub permissions: String,
    pub file_mode: u32,
    pub uid: u32,
    pub gid: u32,
}

fn device_type<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Code(u32),
        Text(String),
    }
    Ok(match Option::<Repr>::deserialize(d)? {
        None | Some(Repr::Code(0)) => String::new(),
        Some(Repr::Code(c)) => char::from_u32(c).map(String::from).unwrap_or_default(),
        Some(Repr::Text(s)) => s,
    })
}

/// Cgroup resource constraints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Resources {
    #[serde(rename = "disableOOMKiller")]
    pub disable_oom_killer: Option<bool>,
    pub oom_score_adj: Option<i32>,
    pub memory: Option<Memory>,
    pub cpu: Option<Cpu>,
    pub pids: Option<Pids>,
    #[serde(rename = "blockIO")]
    pub block_io: Option<BlockIo>,
    #[serde(deserialize_with = "null_as_default")]
    pub hugepage_limits: Vec<HugepageLimit>,
    pub network: Option<Network>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Memory {
    pub limit: Option<i64>,
    pub reservation: Option<i64>,
    pub swap: Option<i64>,
    pub kernel: Option<i64>,
    pub swappiness: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cpu {
    pub shares: Option<u64>,
    pub quota: Option<i64>,
    pub period: Option<u64>,
    pub realtime_runtime: Option<i64>,
    pub realtime_period: Option<u64>,
    pub cpus: Option<String>,
    pub mems: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Pids {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlockIo {
    #[serde(rename = "blkioWeight")]
    pub weight: Option<u16>,
    #[serde(rename = "blkioLeafWeight")]
    pub leaf_weight: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HugepageLimit {
    #[serde(rename = "pageSize", deserialize_with = "null_as_default")]
    pub page_size: String,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Network {
    #[serde(rename = "classID", deserialize_with = "null_as_default")]
    pub class_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub priorities: Vec<InterfacePriority>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InterfacePriority {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub priority: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Seccomp {
    #[serde(deserialize_with = "null_as_default")]
    pub default_action: String,
    #[serde(deserialize_with = "null_as_default")]
    pub architectures: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub syscalls: Vec<Syscall>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Syscall {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(deserialize_with = "null_as_default")]
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Arg {
    pub index: u32,
    pub value: u64,
    pub value_two: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub op: String,
}

impl Schema for RuntimeSpec {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::record_map("mounts", &self.mounts),
            Field::nullable("hooks", &self.hooks).optional(),
        ]
    }
}

impl Schema for Mount {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("type", &self.kind),
            Field::string("source", &self.source),
            Field::list("options", &self.options).optional(),
        ]
    }
}

impl Schema for Hooks {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::records("prestart", &self.prestart).optional(),
            Field::records("poststart", &self.poststart).optional(),
            Field::records("poststop", &self.poststop).optional(),
        ]
    }
}

impl Schema for Hook {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("path", &self.path),
            Field::list("args", &self.args).optional(),
            Field::list("env", &self.env).optional(),
        ]
    }
}

impl Schema for LinuxRuntimeSpec {
    fn fields(&self) -> Vec<Field<'_>> {
        let mut fields = self.runtime.fields();
        fields.push(Field::record("linux", &self.linux));
        fields
    }
}

// Enumerated strings (namespace/rlimit/device types, seccomp actions and
// operators, propagation) are scalars here: the semantic validators own them.
// Only namespaces and devices are required. Mappings, rlimits, sysctl, the
// AppArmor profile and seccomp may be absent or null, since a container
// without them is still runnable.
impl Schema for LinuxRuntime {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::list("uidMappings", &self.uid_mappings).optional(),
            Field::list("gidMappings", &self.gid_mappings).optional(),
            Field::list("rlimits", &self.rlimits).optional(),
            Field::map("sysctl", &self.sysctl).optional(),
            Field::nullable("resources", &self.resources).optional(),
            Field::string("cgroupsPath", &self.cgroups_path).optional(),
            Field::list("namespaces", &self.namespaces),
            Field::records("devices", &self.devices),
            Field::string("apparmorProfile", &self.apparmor_profile).optional(),
            Field::string("selinuxProcessLabel", &self.selinux_process_label).optional(),
            Field::nullable("seccomp", &self.seccomp).optional(),
            Field::scalar("rootfsPropagation"),
        ]
    }
}

impl Schema for Device {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("path", &self.path),
            Field::scalar("type"),
            Field::scalar("major"),
            Field::scalar("minor"),
            Field::string("permissions", &self.permissions).optional(),
            Field::scalar("fileMode"),
            Field::scalar("uid"),
            Field::scalar("gid"),
        ]
    }
}

impl Schema for Resources {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::scalar("disableOOMKiller"),
            Field::scalar("oomScoreAdj"),
            Field::scalar("memory"),
            Field::scalar("cpu"),
            Field::scalar("pids"),
            Field::scalar("blockIO"),
            Field::records("hugepageLimits", &self.hugepage_limits).optional(),
            Field::nullable("network", &self.network).optional(),
        ]
    }
}

impl Schema for HugepageLimit {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("pageSize", &self.page_size),
            Field::scalar("limit"),
        ]
    }
}

impl Schema for Network {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("classID", &self.class_id).optional(),
            Field::records("priorities", &self.priorities).optional(),
        ]
    }
}

impl Schema for InterfacePriority {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::string("name", &self.name), Field::scalar("priority")]
    }
}

impl Schema for Seccomp {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::scalar("defaultAction"),
            Field::list("architectures", &self.architectures).optional(),
            Field::records("syscalls", &self.syscalls).optional(),
        ]
    }
}

impl Schema for Syscall {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("name", &self.name),
            Field::scalar("action"),
            Field::list("args", &self.args).optional(),
        ]
    }
}
