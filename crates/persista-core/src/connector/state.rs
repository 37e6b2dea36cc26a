//! State shared by every connector
//!
//! Single-threaded by construction: instances are `Rc<RefCell<_>>`, so the
//! state is neither `Send` nor `Sync`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use crate::errors::{PersistError, Result};
use crate::model::{Handle, Model, PrimaryKey, Value};

use super::instance::{downcast, erase, Instance, ModelType};
use super::lookup::Lookup;

/// One model's cache bucket, iterated in key order
pub type Bucket = BTreeMap<PrimaryKey, Rc<dyn Instance>>;

/// Identity cache, registered tables and tombstones
#[derive(Default)]
pub struct ConnectorState {
    running: bool,
    objects_tree: HashMap<String, Bucket>,
    tables: BTreeMap<String, ModelType>,
    deleted_objects: HashSet<(String, PrimaryKey)>,
}

impl ConnectorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Register a model and make sure it has a cache bucket
    ///
    /// Re-registering keeps the existing bucket, so handles already given out
    /// stay the cached ones.
    pub fn record_model(&mut self, model: ModelType) -> String {
        let name = model.name().to_string();
        self.tables.insert(name.clone(), model);
        self.objects_tree.entry(name.clone()).or_default();
        name
    }

    pub fn tables(&self) -> impl Iterator<Item = &ModelType> {
        self.tables.values()
    }

    pub fn model_type(&self, name: &str) -> Option<ModelType> {
        self.tables.get(name).copied()
    }

    /// The registered type of `M`, or `ModelNotRecorded`
    pub fn require<M: Model>(&self) -> Result<ModelType> {
        let name = M::schema().name();
        self.model_type(name)
            .ok_or_else(|| PersistError::ModelNotRecorded {
                model: name.to_string(),
            })
    }

    /// Cache lookup on the primary-key projection of `attributes`
    pub fn get_from_cache<M: Model>(&self, attributes: &Lookup) -> Option<Handle<M>> {
        let schema = M::schema();
        self.cached(&attributes.key_projection(schema))
    }

    pub fn cached<M: Model>(&self, key: &PrimaryKey) -> Option<Handle<M>> {
        self.cached_instance(M::schema().name(), key)
            .and_then(|instance| downcast::<M>(&instance))
    }

    pub fn cached_instance(&self, model: &str, key: &PrimaryKey) -> Option<Rc<dyn Instance>> {
        self.objects_tree
            .get(model)
            .and_then(|bucket| bucket.get(key))
            .cloned()
    }

    /// Cache `object` under its current key, replacing any previous entry
    pub fn cache_object<M: Model>(&mut self, object: &Handle<M>) {
        let key = object.borrow().primary_key();
        tracing::debug!(model = M::schema().name(), key = %key, "cache object");
        self.objects_tree
            .entry(M::schema().name().to_string())
            .or_default()
            .insert(key, erase(object));
    }

    /// Cache a freshly loaded instance unless its key is already cached
    ///
    /// Returns the instance that is now cached under that key: the existing
    /// one wins, so a record reloaded from storage never replaces a live
    /// handle.
    pub fn adopt(&mut self, instance: Rc<dyn Instance>) -> Rc<dyn Instance> {
        let schema = instance.schema();
        let key = schema.primary_key_of(&instance.values());
        self.objects_tree
            .entry(schema.name().to_string())
            .or_default()
            .entry(key)
            .or_insert(instance)
            .clone()
    }

    /// Remove `object` from the cache and tombstone its key
    ///
    /// No-op (and no tombstone) when the key is not cached. Returns whether
    /// anything was removed.
    pub fn uncache_object<M: Model>(&mut self, object: &Handle<M>) -> bool {
        let name = M::schema().name();
        let key = object.borrow().primary_key();
        let removed = self
            .objects_tree
            .get_mut(name)
            .and_then(|bucket| bucket.remove(&key))
            .is_some();
        if removed {
            tracing::debug!(model = name, key = %key, "tombstone object");
            self.deleted_objects.insert((name.to_string(), key));
        }
        removed
    }

    pub fn was_deleted<M: Model>(&self, object: &Handle<M>) -> bool {
        let key = object.borrow().primary_key();
        self.is_tombstoned(M::schema().name(), &key)
    }

    pub fn is_tombstoned(&self, model: &str, key: &PrimaryKey) -> bool {
        self.deleted_objects
            .contains(&(model.to_string(), key.clone()))
    }

    /// Tombstoned keys of one model
    pub fn tombstones<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a PrimaryKey> + 'a {
        self.deleted_objects
            .iter()
            .filter(move |(name, _)| name == model)
            .map(|(_, key)| key)
    }

    /// `ObjectDeleted` when `object` is tombstoned
    pub fn ensure_live<M: Model>(&self, object: &Handle<M>) -> Result<()> {
        let key = object.borrow().primary_key();
        if self.is_tombstoned(M::schema().name(), &key) {
            return Err(PersistError::ObjectDeleted {
                model: M::schema().name().to_string(),
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Check that `key` can be given to a newly registered object
    ///
    /// The key must be complete, never tombstoned and not cached yet.
    pub fn check_new_key(&self, model: &str, key: &PrimaryKey) -> Result<()> {
        if key.has_null() {
            return Err(PersistError::MissingPrimaryKey {
                model: model.to_string(),
            });
        }
        if self.is_tombstoned(model, key) {
            return Err(PersistError::ObjectDeleted {
                model: model.to_string(),
                key: key.to_string(),
            });
        }
        if self.cached_instance(model, key).is_some() {
            return Err(PersistError::DuplicateKey {
                model: model.to_string(),
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Next integer key: one past every cached or tombstoned key
    pub fn next_auto_key(&self, model: &str) -> i64 {
        let cached = self
            .objects_tree
            .get(model)
            .into_iter()
            .flat_map(|bucket| bucket.keys());
        cached
            .chain(self.tombstones(model))
            .filter_map(|key| match key {
                PrimaryKey::Scalar(Value::Integer(id)) => Some(*id),
                _ => None,
            })
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Empty every bucket; registrations and tombstones survive
    pub fn clear_cache(&mut self) {
        for bucket in self.objects_tree.values_mut() {
            bucket.clear();
        }
    }

    /// Cached instances of one model in key order
    pub fn bucket(&self, model: &str) -> impl Iterator<Item = &Rc<dyn Instance>> {
        self.objects_tree
            .get(model)
            .into_iter()
            .flat_map(|bucket| bucket.values())
    }

    /// Typed handles for every cached instance of `M`, in key order
    pub fn handles<M: Model>(&self) -> Vec<Handle<M>> {
        self.bucket(M::schema().name())
            .filter_map(downcast::<M>)
            .collect()
    }

    pub fn cached_count(&self, model: &str) -> usize {
        self.objects_tree.get(model).map(Bucket::len).unwrap_or(0)
    }
}
