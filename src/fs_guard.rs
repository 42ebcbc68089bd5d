use std::{fs, io, path::Path};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::LoadError;

/// Upper bound for a single descriptor file.
pub const MAX_DESCRIPTOR_BYTES: u64 = 16 * 1024 * 1024;

/// Reads a descriptor after verifying it is a regular, non-symlinked file
/// within `max_bytes`. The handle is closed before returning.
///
/// NOTE: narrow TOCTOU window between `symlink_metadata()` and `fs::read()`.
pub fn read_validated(path: &Path, max_bytes: u64) -> Result<Vec<u8>, LoadError> {
    let meta = fs::symlink_metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::Missing(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    if meta.file_type().is_symlink() {
        return Err(LoadError::Symlink(path.to_path_buf()));
    }
    if meta.len() > max_bytes {
        return Err(LoadError::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            max: max_bytes,
        });
    }
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a JSON descriptor document. The top level must be a JSON object.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let bytes = read_validated(path, MAX_DESCRIPTOR_BYTES)?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if !value.is_object() {
        return Err(LoadError::NotRecord(path.to_path_buf()));
    }
    Ok(value)
}

/// Decodes an already loaded document into a typed descriptor.
pub fn decode<T: DeserializeOwned>(path: &Path, document: Value) -> Result<T, LoadError> {
    serde_json::from_value(document).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and decodes a JSON descriptor in one step.
pub fn load_descriptor<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    decode(path, load_document(path)?)
}
