//! Declarative models
//!
//! A model is a plain struct whose fields are [`FieldValue`]s, described by a
//! [`ModelSchema`] built once per type. The [`model!`](crate::model!) macro
//! writes both the struct and its [`Model`] implementation.

mod key;
mod macros;
mod persist;
mod schema;
mod value;

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::{PersistError, Result};

pub use key::PrimaryKey;
pub use persist::{ObjectExt, Persist};
pub use schema::{pluralize, reflect, FieldDescriptor, ModelSchema, Reflection, SchemaBuilder};
pub use value::{FieldType, FieldValue, Value};

/// A live, shared model instance
///
/// The identity cache hands out clones of the same `Rc`, so two handles for
/// one record are `Rc::ptr_eq`.
pub type Handle<M> = Rc<RefCell<M>>;

/// A persistable record type
pub trait Model: Sized + 'static {
    /// The schema of this type, built once
    fn schema() -> &'static ModelSchema;

    /// Current values in declaration order
    fn values(&self) -> Vec<Value>;

    /// Build an instance from values in declaration order
    fn from_values(values: Vec<Value>) -> Result<Self>;

    /// Assign one field by name
    fn set_value(&mut self, field: &str, value: Value) -> Result<()>;

    fn value(&self, field: &str) -> Option<Value> {
        let position = Self::schema().position(field)?;
        self.values().into_iter().nth(position)
    }

    /// Primary key of the current values
    fn primary_key(&self) -> PrimaryKey {
        Self::schema().primary_key_of(&self.values())
    }
}

/// Error for a field name the model does not declare
pub fn unknown_field(schema: &ModelSchema, field: &str) -> PersistError {
    PersistError::UnknownField {
        model: schema.name().to_string(),
        field: field.to_string(),
    }
}
