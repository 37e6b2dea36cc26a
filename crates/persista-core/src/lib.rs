//! Persista Core - identity cache and connector contract
//!
//! This crate provides the storage-agnostic half of Persista:
//! - Declarative models with reflected schemas (`model!`)
//! - Primary keys, field values and equality lookups
//! - The `Connector` trait with the shared identity cache and tombstones
//! - Connector configuration, the error facility and structured logging
//!
//! Storage backends live in `persista-store`.

pub mod config;
pub mod connector;
pub mod errors;
pub mod logging_facility;
pub mod model;

#[doc(hidden)]
pub use tracing;

// Re-export commonly used types
pub use config::ConnectorConfig;
pub use connector::{Connector, ConnectorState, Lookup, ModelType};
pub use errors::{ExError, ExErrorKind, PersistError, Result};
pub use model::{FieldType, Handle, Model, ObjectExt, Persist, PrimaryKey, Value};
