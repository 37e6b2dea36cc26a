//! Model-level operations
//!
//! Every operation takes the connector explicitly; nothing resolves a
//! connector from global state.

use crate::connector::{Connector, Lookup};
use crate::errors::{PersistError, Result};

use super::{unknown_field, Handle, Model, Value};

/// Type-level operations available on every model
pub trait Persist: Model {
    /// Persist a new object and return its live handle
    fn create<C: Connector>(self, connector: &mut C) -> Result<Handle<Self>> {
        connector.register_object(self)
    }

    /// Find by primary-key value (single-key models)
    fn find<C: Connector>(connector: &mut C, key: impl Into<Value>) -> Result<Handle<Self>> {
        let lookup = Lookup::primary_key::<Self>([key.into()])?;
        connector.find::<Self>(&lookup)
    }

    /// Find by an arbitrary equality lookup
    fn find_by<C: Connector>(connector: &mut C, lookup: &Lookup) -> Result<Handle<Self>> {
        connector.find::<Self>(lookup)
    }

    fn all<C: Connector>(connector: &mut C) -> Result<Vec<Handle<Self>>> {
        connector.get_all::<Self>()
    }

    /// Cache-only lookup; never touches storage
    fn cached<C: Connector>(connector: &C, lookup: &Lookup) -> Option<Handle<Self>> {
        connector.get_from_cache::<Self>(lookup)
    }
}

impl<M: Model> Persist for M {}

/// Operations on a live instance
pub trait ObjectExt {
    /// Assign a field and notify the connector
    ///
    /// Fails without touching the instance when the object was deleted, the
    /// field is unknown or part of the primary key. When the connector fails
    /// to persist the change the previous value is put back.
    fn assign<C: Connector>(
        &self,
        connector: &mut C,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<()>;

    fn delete<C: Connector>(&self, connector: &mut C) -> Result<()>;

    fn is_deleted<C: Connector>(&self, connector: &C) -> bool;
}

impl<M: Model> ObjectExt for Handle<M> {
    fn assign<C: Connector>(
        &self,
        connector: &mut C,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        let schema = M::schema();
        let descriptor = schema
            .field(field)
            .ok_or_else(|| unknown_field(schema, field))?;
        connector.state().ensure_live(self)?;
        if descriptor.is_primary_key {
            return Err(PersistError::ImmutablePrimaryKey {
                model: schema.name().to_string(),
                field: field.to_string(),
            });
        }
        let previous = self.borrow().value(field);
        self.borrow_mut().set_value(field, value.into())?;
        if let Err(e) = connector.update(self, field) {
            if let Some(previous) = previous {
                self.borrow_mut().set_value(field, previous)?;
            }
            return Err(e);
        }
        Ok(())
    }

    fn delete<C: Connector>(&self, connector: &mut C) -> Result<()> {
        connector.delete(self)
    }

    fn is_deleted<C: Connector>(&self, connector: &C) -> bool {
        connector.was_deleted(self)
    }
}
