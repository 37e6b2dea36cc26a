//! Bulk-file backend over YAML
//!
//! Each model's records live in `<location>/<model>.yml` and are loaded whole
//! when the model is recorded. The loaded rows are kept apart from the
//! identity cache, so clearing the cache never loses stored records. Writes
//! change those rows in memory until [`tick`](Connector::tick) rewrites the
//! files of every model touched since the last tick.

mod codec;

pub use codec::{decode_table, encode_table};

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use persista_core::config::{ConnectorConfig, YAML_DRIVER};
use persista_core::connector::{typed, Connector, ConnectorState, Lookup, ModelType};
use persista_core::errors::{PersistError, Result};
use persista_core::logged_op;
use persista_core::model::{Handle, Model, PrimaryKey, Value};

use crate::atomic::atomic_write;
use crate::errors::{data_formatting, io_error, not_set_up};
use crate::location::resolve_location;

#[derive(Default)]
pub struct YamlConnector {
    state: ConnectorState,
    location: Option<PathBuf>,
    /// Stored rows per model, in key order
    records: HashMap<String, Table>,
    dirty: BTreeSet<String>,
}

type Table = BTreeMap<PrimaryKey, Vec<Value>>;

impl YamlConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Record file of a model
    pub fn file_for(&self, model: &str) -> Result<PathBuf> {
        self.location
            .as_ref()
            .map(|location| location.join(format!("{}.yml", model)))
            .ok_or_else(|| not_set_up(YAML_DRIVER))
    }

    /// Models with changes not yet written
    pub fn dirty_models(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    fn mark_dirty(&mut self, model: &str) {
        self.dirty.insert(model.to_string());
    }

    /// Stored rows of one model
    pub fn stored_count(&self, model: &str) -> usize {
        self.records.get(model).map(Table::len).unwrap_or(0)
    }

    fn read_table(&mut self, model: ModelType, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path).map_err(|e| io_error("read_table", e))?;
        let rows = decode_table(path, model.schema(), &content)?;
        let mut table = Table::new();
        let mut loaded = Vec::new();
        for row in rows {
            let key = model.schema().primary_key_of(&row);
            if key.has_null() {
                return Err(data_formatting(path, "a record has no primary key"));
            }
            if table.contains_key(&key) {
                return Err(data_formatting(
                    path,
                    format!("duplicate primary key {}", key),
                ));
            }
            let instance = model.materialize(row.clone()).map_err(|e| match e {
                PersistError::TypeMismatch { .. } => data_formatting(path, e.to_string()),
                other => other,
            })?;
            loaded.push(instance);
            table.insert(key, row);
        }
        for instance in loaded {
            self.state.adopt(instance);
        }
        let count = table.len();
        self.records.insert(model.name().to_string(), table);
        Ok(count)
    }

    fn write_table(&self, model: &str) -> Result<()> {
        let Some(model_type) = self.state.model_type(model) else {
            return Ok(());
        };
        let rows: Vec<Vec<Value>> = self
            .records
            .get(model)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default();
        let content = encode_table(model_type.schema(), &rows)?;
        atomic_write(&self.file_for(model)?, content.as_bytes())?;
        tracing::debug!(model, record_count = rows.len(), "table written");
        Ok(())
    }

    /// Store the current values of `object` under its key
    fn store_row<M: Model>(&mut self, object: &Handle<M>) {
        let object = object.borrow();
        self.records
            .entry(M::schema().name().to_string())
            .or_default()
            .insert(object.primary_key(), object.values());
        self.mark_dirty(M::schema().name());
    }

    /// Cached instance for a stored row, materialized on first use
    fn instance_for<M: Model>(&mut self, key: &PrimaryKey, row: Vec<Value>) -> Result<Handle<M>> {
        let model = M::schema().name();
        let instance = match self.state.cached_instance(model, key) {
            Some(cached) => cached,
            None => {
                let loaded = ModelType::of::<M>().materialize(row)?;
                self.state.adopt(loaded)
            }
        };
        typed::<M>(&instance)
    }

    fn next_auto_key(&self, model: &str) -> i64 {
        let stored = self
            .records
            .get(model)
            .into_iter()
            .flat_map(|table| table.keys())
            .filter_map(|key| match key {
                PrimaryKey::Scalar(Value::Integer(id)) => Some(*id + 1),
                _ => None,
            })
            .max()
            .unwrap_or(1);
        stored.max(self.state.next_auto_key(model))
    }
}

impl Connector for YamlConnector {
    fn driver_name(&self) -> &'static str {
        YAML_DRIVER
    }

    fn state(&self) -> &ConnectorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ConnectorState {
        &mut self.state
    }

    fn setup(&mut self, config: &ConnectorConfig) -> Result<()> {
        logged_op!("setup", {
            let location = resolve_location(config.require_location(YAML_DRIVER)?)?;
            tracing::debug!(driver = YAML_DRIVER, location = %location.display(), "record files ready");
            self.location = Some(location);
            Ok(())
        })
    }

    fn record_tables(&mut self, models: &[ModelType]) -> Result<()> {
        logged_op!("record_tables", {
            for model in models {
                self.record_model(*model)?;
            }
            self.state.set_running(true);
            Ok(())
        })
    }

    fn record_model(&mut self, model: ModelType) -> Result<String> {
        let schema = model.schema();
        if schema.primary_key_names().is_empty() {
            return Err(PersistError::MissingPrimaryKey {
                model: schema.name().to_string(),
            });
        }
        let path = self.file_for(schema.name())?;
        let name = self.state.record_model(model);
        // Re-recording keeps the rows already held, pending writes included
        if self.records.contains_key(&name) {
            return Ok(name);
        }
        if path.exists() {
            let count = self.read_table(model, &path)?;
            tracing::debug!(model = %name, record_count = count, "table loaded");
        } else {
            self.records.insert(name.clone(), Table::new());
        }
        Ok(name)
    }

    fn find<M: Model>(&mut self, lookup: &Lookup) -> Result<Handle<M>> {
        let schema = self.state.require::<M>()?.schema();
        lookup.validate(schema)?;
        if let Some(cached) = self.state.get_from_cache::<M>(lookup) {
            return Ok(cached);
        }
        let (key, row) = self
            .records
            .get(schema.name())
            .and_then(|table| {
                table
                    .iter()
                    .find(|(_, row)| lookup.matches(schema, row))
                    .map(|(key, row)| (key.clone(), row.clone()))
            })
            .ok_or_else(|| PersistError::NotFound {
                model: schema.name().to_string(),
                lookup: lookup.to_string(),
            })?;
        self.instance_for::<M>(&key, row)
    }

    fn update<M: Model>(&mut self, object: &Handle<M>, field: &str) -> Result<()> {
        self.state.ensure_live(object)?;
        let model = M::schema().name();
        let key = object.borrow().primary_key();
        let stored = self
            .records
            .get(model)
            .is_some_and(|table| table.contains_key(&key));
        if !stored {
            return Err(PersistError::ObjectDeleted {
                model: model.to_string(),
                key: key.to_string(),
            });
        }
        tracing::debug!(model, field, "field updated");
        self.store_row(object);
        Ok(())
    }

    fn delete<M: Model>(&mut self, object: &Handle<M>) -> Result<()> {
        logged_op!("delete", {
            self.state.require::<M>()?;
            let model = M::schema().name();
            let key = object.borrow().primary_key();
            self.state.uncache_object(object);
            let removed = self
                .records
                .get_mut(model)
                .is_some_and(|table| table.remove(&key).is_some());
            if removed {
                self.mark_dirty(model);
            }
            Ok(())
        })
    }

    fn register_object<M: Model>(&mut self, object: M) -> Result<Handle<M>> {
        logged_op!("register_object", {
            self.state.require::<M>()?;
            let schema = M::schema();
            let mut object = object;
            if let Some(field) = schema.auto_key_field() {
                if object.value(field.field_name).map_or(true, |v| v.is_null()) {
                    let id = self.next_auto_key(schema.name());
                    object.set_value(field.field_name, Value::Integer(id))?;
                }
            }
            let key = object.primary_key();
            self.state.check_new_key(schema.name(), &key)?;
            let stored = self
                .records
                .get(schema.name())
                .is_some_and(|table| table.contains_key(&key));
            if stored {
                return Err(PersistError::DuplicateKey {
                    model: schema.name().to_string(),
                    key: key.to_string(),
                });
            }

            let handle = Rc::new(RefCell::new(object));
            self.state.cache_object(&handle);
            self.store_row(&handle);
            Ok(handle)
        })
    }

    fn get_all<M: Model>(&mut self) -> Result<Vec<Handle<M>>> {
        self.state.require::<M>()?;
        let rows: Vec<(PrimaryKey, Vec<Value>)> = self
            .records
            .get(M::schema().name())
            .map(|table| table.iter().map(|(k, r)| (k.clone(), r.clone())).collect())
            .unwrap_or_default();
        rows.into_iter()
            .map(|(key, row)| self.instance_for::<M>(&key, row))
            .collect()
    }

    fn tick(&mut self) -> Result<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }
        logged_op!("tick", {
            let dirty: Vec<String> = self.dirty.iter().cloned().collect();
            for model in dirty {
                self.write_table(&model)?;
                self.dirty.remove(&model);
            }
            Ok(())
        })
    }

    fn destroy(&mut self) -> Result<()> {
        logged_op!("destroy", {
            let names: Vec<String> = self.state.tables().map(|t| t.name().to_string()).collect();
            for name in names {
                let path = self.file_for(&name)?;
                if path.exists() {
                    fs::remove_file(&path).map_err(|e| io_error("remove_table", e))?;
                }
            }
            self.dirty.clear();
            self.records.values_mut().for_each(Table::clear);
            self.state.clear_cache();
            self.state.set_running(false);
            Ok(())
        })
    }
}
