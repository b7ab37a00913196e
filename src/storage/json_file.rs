//! JSON file helpers
//!
//! Whole-file read and rewrite used by snapshots, indexes and the catalog.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{JsonDbError, Result};

/// Read and decode a JSON file
///
/// Returns `Ok(None)` when the file does not exist or is empty.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(JsonDbError::storage(path, e)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| JsonDbError::Serialization(format!("{}: {}", path.display(), e)))
}

/// Encode and write a JSON file, replacing any previous content
///
/// Creates the parent directory when missing. The write truncates in place;
/// a failure midway can leave a partial file behind.
pub fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .map_err(|e| JsonDbError::Serialization(format!("{}: {}", path.display(), e)))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| JsonDbError::storage(parent, e))?;
    }

    fs::write(path, bytes).map_err(|e| JsonDbError::storage(path, e))
}

/// Remove a file, treating "already gone" as success
pub fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(JsonDbError::storage(path, e)),
    }
}

/// Move a file, treating a missing source as success
pub fn rename_file(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(JsonDbError::storage(from, e)),
    }
}
