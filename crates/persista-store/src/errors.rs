//! Error helpers for persista-store
//!
//! Map driver and filesystem errors into `PersistError`

use std::path::Path;

use persista_core::errors::PersistError;

pub use persista_core::errors::Result;

/// Create a persistence error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> PersistError {
    PersistError::Persistence {
        op: "sqlite".to_string(),
        message: err.to_string(),
    }
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> PersistError {
    PersistError::Io {
        op: operation.to_string(),
        message: err.to_string(),
    }
}

/// Create a data formatting error for a YAML document
pub fn yaml_error(path: &Path, err: serde_yaml::Error) -> PersistError {
    PersistError::DataFormatting {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Create a data formatting error with a custom reason
pub fn data_formatting(path: &Path, reason: impl Into<String>) -> PersistError {
    PersistError::DataFormatting {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Error for a connector used before `setup`
pub fn not_set_up(driver: &str) -> PersistError {
    PersistError::InsufficientConfiguration {
        reason: format!("the {} data connector was not set up", driver),
    }
}
