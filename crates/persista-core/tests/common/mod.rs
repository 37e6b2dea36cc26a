//! Shared fixtures: two models and an in-memory connector
//!
//! The in-memory connector keeps "stored" rows in a map so the default
//! `Connector` methods can be exercised without a real backend.

use std::collections::BTreeMap;

use persista_core::config::ConnectorConfig;
use persista_core::connector::{typed, Connector, ConnectorState, Lookup};
use persista_core::errors::{PersistError, Result};
use persista_core::model::{Handle, Model, PrimaryKey, Value};
use persista_core::{model, ModelType};

model! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct User {
        #[key]
        id: Option<i64>,
        username: String,
    }
}

model! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Membership {
        #[key]
        group_id: i64,
        #[key]
        user_id: i64,
        role: String,
    }
}

#[allow(dead_code)]
pub fn user(username: &str) -> User {
    User {
        id: None,
        username: username.to_string(),
    }
}

#[allow(dead_code)]
pub fn membership(group_id: i64, user_id: i64, role: &str) -> Membership {
    Membership {
        group_id,
        user_id,
        role: role.to_string(),
    }
}

/// Connector whose storage is a map of rows per model
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryConnector {
    state: ConnectorState,
    rows: BTreeMap<String, BTreeMap<PrimaryKey, Vec<Value>>>,
    pub reads: usize,
    /// Make every `update` fail as a broken backend would
    pub fail_updates: bool,
}

#[allow(dead_code)]
impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector with `User` and `Membership` recorded
    pub fn running() -> Self {
        let mut connector = Self::new();
        connector
            .record_tables(&[ModelType::of::<User>(), ModelType::of::<Membership>()])
            .unwrap();
        connector
    }

    /// Insert a row behind the cache's back
    pub fn insert_row<M: Model>(&mut self, object: &M) {
        self.rows
            .entry(M::schema().name().to_string())
            .or_default()
            .insert(object.primary_key(), object.values());
    }

    pub fn stored<M: Model>(&self, key: &PrimaryKey) -> Option<Vec<Value>> {
        self.rows
            .get(M::schema().name())
            .and_then(|rows| rows.get(key))
            .cloned()
    }
}

impl Connector for MemoryConnector {
    fn driver_name(&self) -> &'static str {
        "memory"
    }

    fn state(&self) -> &ConnectorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ConnectorState {
        &mut self.state
    }

    fn setup(&mut self, _config: &ConnectorConfig) -> Result<()> {
        Ok(())
    }

    fn find<M: Model>(&mut self, lookup: &Lookup) -> Result<Handle<M>> {
        let model_type = self.state.require::<M>()?;
        let schema = model_type.schema();
        lookup.validate(schema)?;
        if let Some(cached) = self.state.get_from_cache::<M>(lookup) {
            return Ok(cached);
        }
        self.reads += 1;
        let row = self
            .rows
            .get(schema.name())
            .and_then(|rows| rows.values().find(|row| lookup.matches(schema, row)))
            .cloned()
            .ok_or_else(|| PersistError::NotFound {
                model: schema.name().to_string(),
                lookup: lookup.to_string(),
            })?;
        let instance = self.state.adopt(model_type.materialize(row)?);
        typed::<M>(&instance)
    }

    fn update<M: Model>(&mut self, object: &Handle<M>, _field: &str) -> Result<()> {
        self.state.ensure_live(object)?;
        if self.fail_updates {
            return Err(PersistError::Persistence {
                op: "update".to_string(),
                message: "storage unavailable".to_string(),
            });
        }
        let borrowed = object.borrow();
        self.insert_row(&*borrowed);
        Ok(())
    }

    fn register_object<M: Model>(&mut self, object: M) -> Result<Handle<M>> {
        self.state.require::<M>()?;
        let handle = std::rc::Rc::new(std::cell::RefCell::new(object));
        self.insert_row(&*handle.borrow());
        self.state.cache_object(&handle);
        Ok(handle)
    }

    fn get_all<M: Model>(&mut self) -> Result<Vec<Handle<M>>> {
        self.state.require::<M>()?;
        Ok(self.state.handles::<M>())
    }

    fn destroy(&mut self) -> Result<()> {
        self.rows.clear();
        self.state.clear_cache();
        Ok(())
    }
}
