//! Type-erased cached instances
//!
//! The identity cache holds instances of many model types side by side. Each
//! entry is the same `Rc<RefCell<M>>` handed to callers, viewed through
//! [`Instance`]; [`downcast`] recovers the typed handle without copying.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::errors::{PersistError, Result};
use crate::model::{Handle, Model, ModelSchema, Value};

pub trait Instance: Any {
    fn schema(&self) -> &'static ModelSchema;

    /// Current values in declaration order
    fn values(&self) -> Vec<Value>;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<M: Model> Instance for RefCell<M> {
    fn schema(&self) -> &'static ModelSchema {
        M::schema()
    }

    fn values(&self) -> Vec<Value> {
        self.borrow().values()
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Recover the typed handle behind a cached instance
pub fn downcast<M: Model>(instance: &Rc<dyn Instance>) -> Option<Handle<M>> {
    Rc::clone(instance).into_any().downcast::<RefCell<M>>().ok()
}

/// Typed handle for an instance known to belong to `M`'s model name
///
/// Fails when a different type was recorded under the same name.
pub fn typed<M: Model>(instance: &Rc<dyn Instance>) -> Result<Handle<M>> {
    downcast::<M>(instance).ok_or_else(|| PersistError::ModelNotRecorded {
        model: M::schema().name().to_string(),
    })
}

/// View a typed handle as a cache entry (same allocation)
pub fn erase<M: Model>(handle: &Handle<M>) -> Rc<dyn Instance> {
    Rc::clone(handle) as Rc<dyn Instance>
}

/// A registered model type
///
/// Carries what a connector needs without knowing the concrete type: the
/// schema, and a constructor for instances loaded from storage.
#[derive(Clone, Copy)]
pub struct ModelType {
    schema: fn() -> &'static ModelSchema,
    materialize: fn(Vec<Value>) -> Result<Rc<dyn Instance>>,
}

impl ModelType {
    pub fn of<M: Model>() -> Self {
        Self {
            schema: M::schema,
            materialize: materialize::<M>,
        }
    }

    pub fn schema(&self) -> &'static ModelSchema {
        (self.schema)()
    }

    pub fn name(&self) -> &'static str {
        self.schema().name()
    }

    /// Build a new instance from values in declaration order
    pub fn materialize(&self, values: Vec<Value>) -> Result<Rc<dyn Instance>> {
        (self.materialize)(values)
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelType").field(&self.name()).finish()
    }
}

fn materialize<M: Model>(values: Vec<Value>) -> Result<Rc<dyn Instance>> {
    let handle: Handle<M> = Rc::new(RefCell::new(M::from_values(values)?));
    Ok(erase(&handle))
}
