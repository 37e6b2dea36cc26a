//! Driver selection
//!
//! [`DataConnector`] picks a backend by driver name and forwards every
//! operation to it, so application code can hold one concrete type whatever
//! the configured driver.

use persista_core::config::{ConnectorConfig, SQLITE_DRIVER, YAML_DRIVER};
use persista_core::connector::{Connector, ConnectorState, Lookup, ModelType};
use persista_core::errors::{PersistError, Result};
use persista_core::model::{Handle, Model};

use crate::sqlite::SqliteConnector;
use crate::yaml::YamlConnector;

pub enum DataConnector {
    Sqlite(SqliteConnector),
    Yaml(YamlConnector),
}

/// Forward a call to whichever backend is active
macro_rules! dispatch {
    ($self:expr, $conn:ident => $call:expr) => {
        match $self {
            DataConnector::Sqlite($conn) => $call,
            DataConnector::Yaml($conn) => $call,
        }
    };
}

impl DataConnector {
    /// An unconfigured connector for the named driver
    pub fn new(driver: &str) -> Result<Self> {
        match driver {
            SQLITE_DRIVER => Ok(DataConnector::Sqlite(SqliteConnector::new())),
            YAML_DRIVER => Ok(DataConnector::Yaml(YamlConnector::new())),
            other => Err(PersistError::DriverNotFound {
                driver: other.to_string(),
            }),
        }
    }

    /// Build the connector named by `config.driver` and set it up
    pub fn open(config: &ConnectorConfig) -> Result<Self> {
        let driver = config.driver.as_deref().ok_or_else(|| {
            PersistError::InsufficientConfiguration {
                reason: "no driver was specified".to_string(),
            }
        })?;
        let mut connector = Self::new(driver)?;
        connector.setup(config)?;
        Ok(connector)
    }
}

impl Connector for DataConnector {
    fn driver_name(&self) -> &'static str {
        dispatch!(self, c => c.driver_name())
    }

    fn state(&self) -> &ConnectorState {
        dispatch!(self, c => c.state())
    }

    fn state_mut(&mut self) -> &mut ConnectorState {
        dispatch!(self, c => c.state_mut())
    }

    fn setup(&mut self, config: &ConnectorConfig) -> Result<()> {
        dispatch!(self, c => c.setup(config))
    }

    fn record_tables(&mut self, models: &[ModelType]) -> Result<()> {
        dispatch!(self, c => c.record_tables(models))
    }

    fn record_model(&mut self, model: ModelType) -> Result<String> {
        dispatch!(self, c => c.record_model(model))
    }

    fn find<M: Model>(&mut self, lookup: &Lookup) -> Result<Handle<M>> {
        dispatch!(self, c => c.find::<M>(lookup))
    }

    fn update<M: Model>(&mut self, object: &Handle<M>, field: &str) -> Result<()> {
        dispatch!(self, c => c.update(object, field))
    }

    fn delete<M: Model>(&mut self, object: &Handle<M>) -> Result<()> {
        dispatch!(self, c => c.delete(object))
    }

    fn register_object<M: Model>(&mut self, object: M) -> Result<Handle<M>> {
        dispatch!(self, c => c.register_object(object))
    }

    fn get_all<M: Model>(&mut self) -> Result<Vec<Handle<M>>> {
        dispatch!(self, c => c.get_all::<M>())
    }

    fn tick(&mut self) -> Result<()> {
        dispatch!(self, c => c.tick())
    }

    fn destroy(&mut self) -> Result<()> {
        dispatch!(self, c => c.destroy())
    }
}
