//! Relational backend over SQLite
//!
//! One table per model, named by the model's plural form. Writes run inside a
//! transaction that is opened lazily by the first write and committed by
//! [`tick`](Connector::tick).

mod ddl;
mod query;

pub use ddl::{column_type, create_table_sql};

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use rusqlite::{params_from_iter, Connection, ErrorCode, OptionalExtension};

use persista_core::config::{ConnectorConfig, DEFAULT_DATABASE, SQLITE_DRIVER};
use persista_core::connector::{typed, Connector, ConnectorState, Lookup, ModelType};
use persista_core::errors::{PersistError, Result};
use persista_core::model::{Handle, Model, Value};
use persista_core::{log_op_end, log_op_error, log_op_start, logged_op};

use crate::db;
use crate::errors::{from_rusqlite, io_error, not_set_up};
use crate::location::resolve_location;

#[derive(Default)]
pub struct SqliteConnector {
    state: ConnectorState,
    conn: Option<Connection>,
    path: Option<PathBuf>,
    existing_tables: HashSet<String>,
}

impl SqliteConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Database file, once set up
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether writes are waiting for the next `tick`
    pub fn has_pending_writes(&self) -> bool {
        self.conn
            .as_ref()
            .map(|conn| !conn.is_autocommit())
            .unwrap_or(false)
    }

    fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(|| not_set_up(SQLITE_DRIVER))
    }

    /// Connection with the write transaction open
    fn writer(&self) -> Result<&Connection> {
        let conn = self.connection()?;
        if conn.is_autocommit() {
            conn.execute_batch("BEGIN").map_err(from_rusqlite)?;
        }
        Ok(conn)
    }

    /// Drop the open transaction and forget tables it created
    fn rollback(&mut self) -> Result<()> {
        let conn = self.connection()?;
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK").map_err(from_rusqlite)?;
        }
        let tables = db::existing_tables(conn)?;
        self.existing_tables = tables;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let conn = self.connection()?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT").map_err(from_rusqlite)?;
        }
        Ok(())
    }
}

/// Map a constraint failure on insert to `DuplicateKey`
fn insert_error(schema_name: &str, key: String, err: rusqlite::Error) -> PersistError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => PersistError::DuplicateKey {
            model: schema_name.to_string(),
            key,
        },
        _ => from_rusqlite(err),
    }
}

impl Connector for SqliteConnector {
    fn driver_name(&self) -> &'static str {
        SQLITE_DRIVER
    }

    fn state(&self) -> &ConnectorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ConnectorState {
        &mut self.state
    }

    fn setup(&mut self, config: &ConnectorConfig) -> Result<()> {
        logged_op!("setup", {
            let location = resolve_location(config.require_location(SQLITE_DRIVER)?)?;
            let path = location.join(config.database.as_deref().unwrap_or(DEFAULT_DATABASE));
            let conn = db::open(&path)?;
            tracing::debug!(driver = SQLITE_DRIVER, path = %path.display(), "database opened");
            self.existing_tables = db::existing_tables(&conn)?;
            self.conn = Some(conn);
            self.path = Some(path);
            Ok(())
        })
    }

    fn record_tables(&mut self, models: &[ModelType]) -> Result<()> {
        log_op_start!("record_tables", model_count = models.len());
        let start = Instant::now();
        let pending_before = self.has_pending_writes();
        let result = (|| -> Result<()> {
            self.existing_tables = db::existing_tables(self.connection()?)?;
            for model in models {
                self.record_model(*model)?;
            }
            self.commit()
        })();
        match &result {
            Ok(()) => {
                self.state.set_running(true);
                log_op_end!(
                    "record_tables",
                    duration_ms = start.elapsed().as_millis() as u64
                );
            }
            Err(e) => {
                // A failed startup leaves no partial schema behind
                if !pending_before {
                    if let Err(rollback_err) = self.rollback() {
                        tracing::warn!(error = %rollback_err, "rollback failed");
                    }
                }
                log_op_error!(
                    "record_tables",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
            }
        }
        result
    }

    fn record_model(&mut self, model: ModelType) -> Result<String> {
        let schema = model.schema();
        // Validated before any statement runs
        let sql = create_table_sql(schema)?;
        let name = self.state.record_model(model);
        if !self.existing_tables.contains(schema.plural_name()) {
            self.writer()?.execute_batch(&sql).map_err(from_rusqlite)?;
            tracing::debug!(model = %name, table = schema.plural_name(), "table created");
            self.existing_tables.insert(schema.plural_name().to_string());
        }
        Ok(name)
    }

    fn find<M: Model>(&mut self, lookup: &Lookup) -> Result<Handle<M>> {
        let model_type = self.state.require::<M>()?;
        let schema = model_type.schema();
        lookup.validate(schema)?;
        if let Some(cached) = self.state.get_from_cache::<M>(lookup) {
            return Ok(cached);
        }

        let params: Vec<_> = lookup.terms().iter().map(|(_, v)| query::to_sql(v)).collect();
        let raw = self
            .connection()?
            .query_row(&query::select_sql(schema, lookup), params_from_iter(params), |row| {
                query::read_row(schema, row)
            })
            .optional()
            .map_err(from_rusqlite)?
            .ok_or_else(|| PersistError::NotFound {
                model: schema.name().to_string(),
                lookup: lookup.to_string(),
            })?;
        let values = query::convert_row(schema, raw)?;
        if self.state.is_tombstoned(schema.name(), &schema.primary_key_of(&values)) {
            return Err(PersistError::NotFound {
                model: schema.name().to_string(),
                lookup: lookup.to_string(),
            });
        }

        let instance = self.state.adopt(model_type.materialize(values)?);
        typed::<M>(&instance)
    }

    fn update<M: Model>(&mut self, object: &Handle<M>, field: &str) -> Result<()> {
        self.state.ensure_live(object)?;
        let schema = M::schema();
        let (value, key) = {
            let borrowed = object.borrow();
            let value = borrowed
                .value(field)
                .ok_or_else(|| persista_core::model::unknown_field(schema, field))?;
            (value, borrowed.primary_key())
        };
        let mut params = vec![query::to_sql(&value)];
        params.extend(query::key_params(&key));
        self.writer()?
            .execute(&query::update_sql(schema, field), params_from_iter(params))
            .map_err(from_rusqlite)?;
        tracing::debug!(model = schema.name(), key = %key, field, "field updated");
        Ok(())
    }

    fn delete<M: Model>(&mut self, object: &Handle<M>) -> Result<()> {
        let schema = M::schema();
        let key = object.borrow().primary_key();
        logged_op!("delete", {
            self.state.require::<M>()?;
            self.state.uncache_object(object);
            self.writer()?
                .execute(&query::delete_sql(schema), params_from_iter(query::key_params(&key)))
                .map_err(from_rusqlite)?;
            tracing::debug!(model = schema.name(), key = %key, "row deleted");
            Ok(())
        })
    }

    fn register_object<M: Model>(&mut self, object: M) -> Result<Handle<M>> {
        logged_op!("register_object", {
            self.state.require::<M>()?;
            let schema = M::schema();
            let mut object = object;
            let auto_key = schema
                .auto_key_field()
                .filter(|f| object.value(f.field_name).map_or(true, |v| v.is_null()));
            if auto_key.is_none() {
                self.state.check_new_key(schema.name(), &object.primary_key())?;
            }

            let params: Vec<_> = object.values().iter().map(query::to_sql).collect();
            let conn = self.writer()?;
            conn.execute(&query::insert_sql(schema), params_from_iter(params))
                .map_err(|e| insert_error(schema.name(), object.primary_key().to_string(), e))?;
            if let Some(field) = auto_key {
                let id = conn.last_insert_rowid();
                object.set_value(field.field_name, Value::Integer(id))?;
            }

            let handle = Rc::new(RefCell::new(object));
            self.state.cache_object(&handle);
            Ok(handle)
        })
    }

    fn get_all<M: Model>(&mut self) -> Result<Vec<Handle<M>>> {
        let model_type = self.state.require::<M>()?;
        let schema = model_type.schema();
        let rows = {
            let conn = self.connection()?;
            let mut stmt = conn
                .prepare(&query::select_all_sql(schema))
                .map_err(from_rusqlite)?;
            let rows = stmt
                .query_map([], |row| query::read_row(schema, row))
                .map_err(from_rusqlite)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(from_rusqlite)?;
            rows
        };

        let mut handles = Vec::with_capacity(rows.len());
        for raw in rows {
            let values = query::convert_row(schema, raw)?;
            let key = schema.primary_key_of(&values);
            if self.state.is_tombstoned(schema.name(), &key) {
                continue;
            }
            let instance = match self.state.cached_instance(schema.name(), &key) {
                Some(instance) => instance,
                None => self.state.adopt(model_type.materialize(values)?),
            };
            handles.push(typed::<M>(&instance)?);
        }
        Ok(handles)
    }

    fn tick(&mut self) -> Result<()> {
        if !self.has_pending_writes() {
            return Ok(());
        }
        logged_op!("tick", { self.commit() })
    }

    fn destroy(&mut self) -> Result<()> {
        logged_op!("destroy", {
            if let Some(conn) = self.conn.take() {
                conn.close().map_err(|(_, e)| from_rusqlite(e))?;
            }
            if let Some(path) = self.path.take() {
                if path.exists() {
                    fs::remove_file(&path).map_err(|e| io_error("remove_database", e))?;
                }
            }
            self.existing_tables.clear();
            self.state.clear_cache();
            self.state.set_running(false);
            Ok(())
        })
    }
}
