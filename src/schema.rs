//! Required-field walker.
//!
//! Each descriptor record implements [`Schema`] by listing its fields in
//! declaration order, together with whether the field is required and what
//! kind of value it holds. [`walk`] interprets that listing generically:
//!
//! | Kind | Violation when required and... | Recurses into |
//! |------|--------------------------------|---------------|
//! | string | empty | - |
//! | sequence | length 0 | every record element |
//! | map | empty | every record value |
//! | record | never | itself, only when required |
//! | nullable record | absent | itself, whenever present |
//! | scalar | never | - |
//!
//! Violations come out in field-declaration order, depth-first, without
//! deduplication.

use std::collections::BTreeMap;

use crate::outcome::Outcome;

/// A record whose fields can be checked for presence.
pub trait Schema {
    fn fields(&self) -> Vec<Field<'_>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

pub enum Kind<'a> {
    Str(&'a str),
    Seq {
        len: usize,
        records: Vec<&'a dyn Schema>,
    },
    Map {
        len: usize,
        records: Vec<(&'a str, &'a dyn Schema)>,
    },
    Record(&'a dyn Schema),
    Nullable(Option<&'a dyn Schema>),
    Scalar,
}

pub struct Field<'a> {
    pub name: &'static str,
    pub presence: Presence,
    pub kind: Kind<'a>,
}

impl<'a> Field<'a> {
    fn required(name: &'static str, kind: Kind<'a>) -> Self {
        Self {
            name,
            presence: Presence::Required,
            kind,
        }
    }

    /// Marks the field optional. Fields are required unless told otherwise.
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    pub fn string(name: &'static str, value: &'a str) -> Self {
        Self::required(name, Kind::Str(value))
    }

    /// A sequence of plain values (strings, numbers).
    pub fn list<T>(name: &'static str, items: &'a [T]) -> Self {
        Self::required(
            name,
            Kind::Seq {
                len: items.len(),
                records: Vec::new(),
            },
        )
    }

    /// A sequence of records; each element is walked.
    pub fn records<T: Schema>(name: &'static str, items: &'a [T]) -> Self {
        Self::required(
            name,
            Kind::Seq {
                len: items.len(),
                records: items.iter().map(|r| r as &dyn Schema).collect(),
            },
        )
    }

    /// A map of plain values.
    pub fn map<T>(name: &'static str, items: &'a BTreeMap<String, T>) -> Self {
        Self::required(
            name,
            Kind::Map {
                len: items.len(),
                records: Vec::new(),
            },
        )
    }

    /// A map whose values are records; each value is walked.
    pub fn record_map<T: Schema>(name: &'static str, items: &'a BTreeMap<String, T>) -> Self {
        Self::required(
            name,
            Kind::Map {
                len: items.len(),
                records: items
                    .iter()
                    .map(|(k, v)| (k.as_str(), v as &dyn Schema))
                    .collect(),
            },
        )
    }

    pub fn record<T: Schema>(name: &'static str, value: &'a T) -> Self {
        Self::required(name, Kind::Record(value))
    }

    pub fn nullable<T: Schema>(name: &'static str, value: &'a Option<T>) -> Self {
        Self::required(
            name,
            Kind::Nullable(value.as_ref().map(|r| r as &dyn Schema)),
        )
    }

    /// Numbers, booleans and enumerated scalars. Never a violation.
    pub fn scalar(name: &'static str) -> Self {
        Self::required(name, Kind::Scalar)
    }
}

fn empty(path: &str) -> String {
    format!("{path} should not be empty.")
}

/// Walks `record`, reporting every required field left empty. `parent` is
/// the path prefix used in messages, usually the descriptor type name.
pub fn walk(record: &dyn Schema, parent: &str) -> Outcome {
    let mut out = Outcome::pass();
    for field in record.fields() {
        let path = format!("{parent}.{}", field.name);
        let required = field.presence == Presence::Required;
        match field.kind {
            Kind::Str(s) => {
                if required && s.is_empty() {
                    out.push(empty(&path));
                }
            }
            Kind::Seq { len, records } => {
                if required && len == 0 {
                    out.push(empty(&path));
                    continue;
                }
                for (i, r) in records.into_iter().enumerate() {
                    out.absorb(walk(r, &format!("{path}[{i}]")));
                }
            }
            Kind::Map { len, records } => {
                if required && len == 0 {
                    out.push(empty(&path));
                    continue;
                }
                for (key, r) in records {
                    out.absorb(walk(r, &format!("{path}.{key}")));
                }
            }
            Kind::Record(r) => {
                if required {
                    out.absorb(walk(r, &path));
                }
            }
            Kind::Nullable(None) => {
                if required {
                    out.push(format!("{path} should be present."));
                }
            }
            Kind::Nullable(Some(r)) => out.absorb(walk(r, &path)),
            Kind::Scalar => {}
        }
    }
    out
}
