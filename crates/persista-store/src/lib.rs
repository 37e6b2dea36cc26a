//! Persista Store - storage backends
//!
//! Provides:
//! - `SqliteConnector`: one SQLite table per model
//! - `YamlConnector`: one YAML record file per model
//! - `DataConnector`: driver selection by name
//! - Location resolution and atomic file replacement shared by both

pub mod atomic;
pub mod connector;
pub mod db;
pub mod errors;
pub mod location;
pub mod sqlite;
pub mod yaml;

// Re-export key types
pub use connector::DataConnector;
pub use errors::Result;
pub use sqlite::SqliteConnector;
pub use yaml::YamlConnector;
