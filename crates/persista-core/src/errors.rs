use thiserror::Error;

/// Result type alias using PersistError
pub type Result<T> = std::result::Result<T, PersistError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on without
/// depending on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Configuration
    InsufficientConfiguration,
    DriverNotFound,
    DriverInitialization,

    // Lookup
    NotFound,
    Deleted,
    InvalidInput,

    // Schema / data
    Schema,
    DataFormatting,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InsufficientConfiguration => "ERR_INSUFFICIENT_CONFIGURATION",
            ExErrorKind::DriverNotFound => "ERR_DRIVER_NOT_FOUND",
            ExErrorKind::DriverInitialization => "ERR_DRIVER_INITIALIZATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Deleted => "ERR_DELETED",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Schema => "ERR_SCHEMA",
            ExErrorKind::DataFormatting => "ERR_DATA_FORMATTING",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether the caller may reasonably recover from this kind of failure
    ///
    /// Only `NotFound` qualifies: everything else is either fatal at startup
    /// or permanent for the object involved.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ExErrorKind::NotFound)
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    model: Option<String>,
    key: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            model: None,
            key: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add model name context
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add primary key context
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(model) = &self.model {
            write!(f, " (model: {})", model)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for persistence operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistError {
    // ===== Configuration Errors =====
    /// A required connector option is missing
    #[error("Insufficient configuration: {reason}")]
    InsufficientConfiguration { reason: String },

    /// The requested storage driver does not exist
    #[error("Driver not found: {driver}")]
    DriverNotFound { driver: String },

    /// The storage location cannot be used
    #[error("Cannot initialize driver at {location}: {reason}")]
    DriverInitialization { location: String, reason: String },

    // ===== Lookup Errors =====
    /// No stored record matches the lookup
    #[error("No {model} matches {lookup}")]
    NotFound { model: String, lookup: String },

    /// The object was deleted and can no longer be modified
    #[error("The object {model} {key} was deleted, can't update it")]
    ObjectDeleted { model: String, key: String },

    /// The model type was never passed to `record_tables`
    #[error("Model {model} was not recorded by this connector")]
    ModelNotRecorded { model: String },

    /// A field name does not belong to the model
    #[error("Model {model} has no field {field}")]
    UnknownField { model: String, field: String },

    /// A lookup cannot be built for this model
    #[error("Invalid lookup on {model}: {reason}")]
    InvalidLookup { model: String, reason: String },

    /// A value does not match the declared type of its field
    #[error("Field {field} expects {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// Another record already uses this primary key
    #[error("A {model} with primary key {key} already exists")]
    DuplicateKey { model: String, key: String },

    /// Primary-key fields cannot change once the object is live
    #[error("Primary key field {field} of {model} cannot be reassigned")]
    ImmutablePrimaryKey { model: String, field: String },

    // ===== Schema / Data Errors =====
    /// The model declares no primary-key field, or an object has no usable key
    #[error("Model {model} has no usable primary key")]
    MissingPrimaryKey { model: String },

    /// A declared field type has no storage mapping in this backend
    #[error("Field {model}.{field} has type {field_type} which has no column mapping")]
    UnmappedFieldType {
        model: String,
        field: String,
        field_type: String,
    },

    /// Stored content does not have the expected shape
    #[error("Data formatting error in {path}: {reason}")]
    DataFormatting { path: String, reason: String },

    // ===== Integration Errors =====
    /// Storage engine failure
    #[error("Persistence error in {op}: {message}")]
    Persistence { op: String, message: String },

    /// Filesystem failure
    #[error("IO error in {op}: {message}")]
    Io { op: String, message: String },

    /// Encoding failure
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl PersistError {
    /// Classify this error into the canonical kind taxonomy
    pub fn kind(&self) -> ExErrorKind {
        match self {
            PersistError::InsufficientConfiguration { .. } => {
                ExErrorKind::InsufficientConfiguration
            }
            PersistError::DriverNotFound { .. } => ExErrorKind::DriverNotFound,
            PersistError::DriverInitialization { .. } => ExErrorKind::DriverInitialization,
            PersistError::NotFound { .. } => ExErrorKind::NotFound,
            PersistError::ObjectDeleted { .. } => ExErrorKind::Deleted,
            PersistError::ModelNotRecorded { .. }
            | PersistError::UnknownField { .. }
            | PersistError::InvalidLookup { .. }
            | PersistError::TypeMismatch { .. }
            | PersistError::DuplicateKey { .. }
            | PersistError::ImmutablePrimaryKey { .. } => ExErrorKind::InvalidInput,
            PersistError::MissingPrimaryKey { .. } | PersistError::UnmappedFieldType { .. } => {
                ExErrorKind::Schema
            }
            PersistError::DataFormatting { .. } => ExErrorKind::DataFormatting,
            PersistError::Persistence { .. } => ExErrorKind::Persistence,
            PersistError::Io { .. } => ExErrorKind::Io,
            PersistError::Serialization { .. } => ExErrorKind::Serialization,
        }
    }
}

/// Conversion from PersistError to the structured ExError
impl From<PersistError> for ExError {
    fn from(err: PersistError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        let ex = ExError::new(kind);
        match err {
            PersistError::NotFound { model, .. }
            | PersistError::ModelNotRecorded { model }
            | PersistError::UnknownField { model, .. }
            | PersistError::InvalidLookup { model, .. }
            | PersistError::ImmutablePrimaryKey { model, .. }
            | PersistError::MissingPrimaryKey { model }
            | PersistError::UnmappedFieldType { model, .. } => {
                ex.with_model(model).with_message(message)
            }
            PersistError::ObjectDeleted { model, key }
            | PersistError::DuplicateKey { model, key } => {
                ex.with_model(model).with_key(key).with_message(message)
            }
            PersistError::Persistence { op, .. } | PersistError::Io { op, .. } => {
                ex.with_op(op).with_message(message)
            }
            _ => ex.with_message(message),
        }
    }
}
