//! Runtime state of a created container (`state.json`).

use serde::Deserialize;

use super::null_as_default;
use crate::schema::{Field, Schema};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct State {
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Process id of the container's main process.
    pub pid: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bundle_path: String,
}

impl Schema for State {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("version", &self.version),
            Field::string("id", &self.id),
            Field::scalar("pid"),
            Field::string("bundlePath", &self.bundle_path),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::walk;

    #[test]
    fn decodes_camel_case_bundle_path() {
        let s: State = serde_json::from_str(
            r#"{"version": "0.3.0", "id": "c1", "pid": 7, "bundlePath": "/run/c1"}"#,
        )
        .unwrap();
        assert_eq!(s.bundle_path, "/run/c1");
        assert!(walk(&s, "State").passed);
    }

    #[test]
    fn pid_is_never_required() {
        let s = State {
            version: "0.3.0".into(),
            id: "c1".into(),
            pid: 0,
            bundle_path: "/run/c1".into(),
        };
        assert!(walk(&s, "State").passed);
    }

    #[test]
    fn null_strings_are_reported_as_empty() {
        let s: State = serde_json::from_str(
            r#"{"version": "0.3.0", "id": null, "pid": 7, "bundlePath": "/run/c1"}"#,
        )
        .unwrap();
        assert_eq!(walk(&s, "State").messages, vec!["State.id should not be empty."]);
    }
}
