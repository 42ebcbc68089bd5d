//! Build-time descriptor (`config.json`).

use serde::Deserialize;

use super::null_as_default;
use crate::schema::{Field, Schema};

/// Platform-independent container configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Spec {
    /// Version of the configuration format the bundle follows.
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    pub platform: Platform,
    pub process: Process,
    pub root: Root,
    #[serde(deserialize_with = "null_as_default")]
    pub hostname: String,
    /// Mount points the runtime must fill, in declaration order.
    #[serde(deserialize_with = "null_as_default")]
    pub mounts: Vec<MountPoint>,
}

/// Host OS and architecture the container is built for.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Platform {
    #[serde(deserialize_with = "null_as_default")]
    pub os: String,
    #[serde(deserialize_with = "null_as_default")]
    pub arch: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Process {
    pub terminal: bool,
    pub user: User,
    #[serde(deserialize_with = "null_as_default")]
    pub args: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub env: Vec<String>,
    /// Working directory, relative to the container root.
    #[serde(deserialize_with = "null_as_default")]
    pub cwd: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub uid: u32,
    pub gid: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub additional_gids: Vec<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Root {
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    pub readonly: bool,
}

/// A directory the runtime fills with the runtime mount of the same name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MountPoint {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
}

/// Configuration for Linux containers: the generic spec plus a Linux block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinuxSpec {
    #[serde(flatten)]
    pub spec: Spec,
    pub linux: LinuxConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinuxConfig {
    /// Capabilities kept for the container process.
    #[serde(deserialize_with = "null_as_default")]
    pub capabilities: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub rootfs_propagation: String,
}

impl Schema for Spec {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("version", &self.version),
            Field::record("platform", &self.platform),
            Field::record("process", &self.process),
            Field::record("root", &self.root),
            Field::string("hostname", &self.hostname).optional(),
            Field::records("mounts", &self.mounts).optional(),
        ]
    }
}

impl Schema for Platform {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("os", &self.os),
            Field::string("arch", &self.arch),
        ]
    }
}

impl Schema for Process {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::scalar("terminal").optional(),
            Field::record("user", &self.user),
            Field::list("args", &self.args),
            Field::list("env", &self.env).optional(),
            Field::string("cwd", &self.cwd).optional(),
        ]
    }
}

impl Schema for User {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::scalar("uid"),
            Field::scalar("gid"),
            Field::list("additionalGids", &self.additional_gids).optional(),
        ]
    }
}

impl Schema for Root {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("path", &self.path),
            Field::scalar("readonly").optional(),
        ]
    }
}

impl Schema for MountPoint {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("name", &self.name),
            Field::string("path", &self.path),
        ]
    }
}

impl Schema for LinuxSpec {
    fn fields(&self) -> Vec<Field<'_>> {
        let mut fields = self.spec.fields();
        fields.push(Field::record("linux", &self.linux));
        fields
    }
}

impl Schema for LinuxConfig {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            // optional: an empty capability set is a legitimate config
            Field::list("capabilities", &self.capabilities).optional(),
            // enumerated; checked by the semantic validators
            Field::scalar("rootfsPropagation"),
        ]
    }
}
