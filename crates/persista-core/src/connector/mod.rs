//! The connector contract
//!
//! A connector sits between models and one storage backend. It owns the
//! identity cache and the tombstone set ([`ConnectorState`]); backends add
//! the storage side effects. Default methods implement the backend-agnostic
//! behavior, and backends that override one of them call back into
//! [`ConnectorState`] for the shared bookkeeping.

mod instance;
mod lookup;
mod state;

pub use instance::{downcast, erase, typed, Instance, ModelType};
pub use lookup::Lookup;
pub use state::{Bucket, ConnectorState};

use crate::config::ConnectorConfig;
use crate::errors::Result;
use crate::model::{Handle, Model};

pub trait Connector {
    /// Driver name this connector was built for
    fn driver_name(&self) -> &'static str;

    fn state(&self) -> &ConnectorState;

    fn state_mut(&mut self) -> &mut ConnectorState;

    /// Validate the configuration and open storage
    fn setup(&mut self, config: &ConnectorConfig) -> Result<()>;

    /// Register every model, then mark the connector running
    fn record_tables(&mut self, models: &[ModelType]) -> Result<()> {
        for model in models {
            self.record_model(*model)?;
        }
        self.state_mut().set_running(true);
        Ok(())
    }

    /// Register one model; returns its canonical name
    fn record_model(&mut self, model: ModelType) -> Result<String> {
        Ok(self.state_mut().record_model(model))
    }

    /// Cache first, then storage
    ///
    /// Fails with `NotFound` when nothing matches, caching nothing.
    fn find<M: Model>(&mut self, lookup: &Lookup) -> Result<Handle<M>>;

    /// Pure cache lookup on the primary-key projection of `attributes`
    fn get_from_cache<M: Model>(&self, attributes: &Lookup) -> Option<Handle<M>> {
        self.state().get_from_cache::<M>(attributes)
    }

    fn cache_object<M: Model>(&mut self, object: &Handle<M>) {
        self.state_mut().cache_object(object);
    }

    /// Remove from the cache and tombstone; no-op when not cached
    fn uncache_object<M: Model>(&mut self, object: &Handle<M>) {
        self.state_mut().uncache_object(object);
    }

    fn was_deleted<M: Model>(&self, object: &Handle<M>) -> bool {
        self.state().was_deleted(object)
    }

    /// Drop every cached instance; tombstones are kept
    fn clear_cache(&mut self) {
        self.state_mut().clear_cache();
    }

    /// Persist the current value of `field`
    ///
    /// Fails with `ObjectDeleted` once the object has been deleted.
    fn update<M: Model>(&mut self, object: &Handle<M>, _field: &str) -> Result<()> {
        self.state().ensure_live(object)
    }

    /// Uncache (and so tombstone) the object
    fn delete<M: Model>(&mut self, object: &Handle<M>) -> Result<()> {
        self.uncache_object(object);
        Ok(())
    }

    /// Persist a new object and cache it
    fn register_object<M: Model>(&mut self, object: M) -> Result<Handle<M>>;

    /// Every known instance of `M`
    fn get_all<M: Model>(&mut self) -> Result<Vec<Handle<M>>>;

    /// Periodic maintenance hook; flushes buffered writes
    ///
    /// Safe to call at any time and cheap when nothing is pending.
    fn tick(&mut self) -> Result<()> {
        Ok(())
    }

    /// Irreversibly erase everything this connector stored
    fn destroy(&mut self) -> Result<()>;
}
