//! Connector configuration
//!
//! Options are read from YAML, the same format the bulk-file backend stores
//! records in:
//!
//! ```yaml
//! driver: sqlite3
//! location: ~/.persista/sqlite3
//! database: app.db
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{PersistError, Result};

/// Driver name of the relational backend
pub const SQLITE_DRIVER: &str = "sqlite3";
/// Driver name of the bulk-file backend
pub const YAML_DRIVER: &str = "yaml";

/// Database file created inside the location when none is configured
pub const DEFAULT_DATABASE: &str = "sqlite3.db";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Relational backend only: database file name inside `location`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl ConnectorConfig {
    pub fn with_location(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document means "no options"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| PersistError::DataFormatting {
            path: "<config>".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| PersistError::Io {
            op: "read_config".to_string(),
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            PersistError::DataFormatting { reason, .. } => PersistError::DataFormatting {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Default parameters shipped with each driver
    pub fn default_parameters(driver: &str) -> Result<Self> {
        match driver {
            SQLITE_DRIVER => Ok(Self {
                driver: Some(SQLITE_DRIVER.to_string()),
                location: Some("~/.persista/sqlite3".to_string()),
                database: Some(DEFAULT_DATABASE.to_string()),
            }),
            YAML_DRIVER => Ok(Self {
                driver: Some(YAML_DRIVER.to_string()),
                location: Some("~/.persista/yaml".to_string()),
                database: None,
            }),
            other => Err(PersistError::DriverNotFound {
                driver: other.to_string(),
            }),
        }
    }

    /// Read `path`, or write the driver's defaults there first if it is absent
    pub fn load_or_create(path: &Path, driver: &str) -> Result<Self> {
        if path.exists() {
            return Self::from_yaml_file(path);
        }
        let defaults = Self::default_parameters(driver)?;
        let content = serde_yaml::to_string(&defaults).map_err(|e| {
            PersistError::Serialization {
                message: e.to_string(),
            }
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PersistError::Io {
                op: "create_config_dir".to_string(),
                message: e.to_string(),
            })?;
        }
        fs::write(path, content).map_err(|e| PersistError::Io {
            op: "write_config".to_string(),
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(defaults)
    }

    /// The `location` option, or `InsufficientConfiguration`
    pub fn require_location(&self, driver: &str) -> Result<&str> {
        self.location
            .as_deref()
            .ok_or_else(|| PersistError::InsufficientConfiguration {
                reason: format!(
                    "the location for storing data was not specified for the {} data connector",
                    driver
                ),
            })
    }
}
