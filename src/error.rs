//! Errors raised while loading a descriptor file.
//!
//! These never escape the validators: a [`LoadError`] is rendered into a
//! single outcome message and validation of that file stops.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot find the file {}", .0.display())]
    Missing(PathBuf),

    #[error("refusing to read symlink: {}", .0.display())]
    Symlink(PathBuf),

    #[error("file too large: {} ({size} bytes, max {max} bytes)", .path.display())]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a structured record", .0.display())]
    NotRecord(PathBuf),

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
