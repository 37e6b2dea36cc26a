//! Storage location resolution
//!
//! Both backends keep their data under one configured directory. The path is
//! normalized, created when missing, and must be readable and writable.

use std::env;
use std::fs;
use std::path::PathBuf;

use persista_core::errors::{PersistError, Result};
use tempfile::NamedTempFile;

/// Normalize a configured location without touching the filesystem
///
/// Backslashes become `/`, a leading `~` expands to `$HOME` and trailing
/// separators are dropped (the root itself is kept).
pub fn normalize(location: &str) -> String {
    let mut path = location.replace('\\', "/");
    if path == "~" || path.starts_with("~/") {
        if let Ok(home) = env::var("HOME") {
            path = format!("{}{}", home.trim_end_matches('/'), &path[1..]);
        }
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize, create and check the storage directory
pub fn resolve_location(location: &str) -> Result<PathBuf> {
    let normalized = normalize(location);
    let init_error = |reason: String| PersistError::DriverInitialization {
        location: normalized.clone(),
        reason,
    };
    if normalized.is_empty() {
        return Err(init_error("the location is empty".to_string()));
    }

    let path = PathBuf::from(&normalized);
    fs::create_dir_all(&path)
        .map_err(|e| init_error(format!("cannot create the directory: {}", e)))?;

    let metadata = fs::metadata(&path).map_err(|e| init_error(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(init_error("the location is not a directory".to_string()));
    }
    fs::read_dir(&path).map_err(|e| init_error(format!("cannot read: {}", e)))?;
    // Mode bits alone do not tell whether this process may write
    NamedTempFile::new_in(&path)
        .map_err(|e| init_error(format!("cannot write: {}", e)))?;

    tracing::debug!(location = %normalized, "storage location ready");
    Ok(path)
}
