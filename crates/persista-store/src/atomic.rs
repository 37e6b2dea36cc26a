//! Atomic file replacement
//!
//! Uses temp→rename so readers never observe a half-written record file

use crate::errors::{io_error, Result};
use std::fs;
use std::path::Path;

/// Atomically replace `target_path` with `content`
///
/// The temp file lives next to the target so the rename stays on one
/// filesystem.
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_record_dir", e))?;
    }

    let temp_path = target_path.with_extension("yml.tmp");

    fs::write(&temp_path, content).map_err(|e| io_error("write_record_temp", e))?;

    if let Err(e) = fs::rename(&temp_path, target_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error("rename_record_temp", e));
    }

    Ok(())
}
