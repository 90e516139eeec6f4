use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::model::{
    ConfigurationKey, ConfigurationValue, EntityDiction, OverrideRecord, RelationTemplate, Scope,
    ValidationError,
};

type Address = (ConfigurationKey, Scope);

/// In-memory view of every override record, keyed by `(key, scope)`.
///
/// Reads never fail and never block on I/O. Writes validate the value
/// against the key's declared shape and mark the address dirty so derived
/// views can be recomputed.
#[derive(Debug, Default)]
pub struct ConfigurationStore {
    entries: RwLock<BTreeMap<Address, OverrideRecord>>,
    dirty: Mutex<BTreeSet<Address>>,
    write_locks: Mutex<BTreeMap<Address, Arc<tokio::sync::Mutex<()>>>>,
}

impl ConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, or `None` when the pair was never configured.
    /// A stored empty collection is returned as-is.
    pub fn get(&self, key: ConfigurationKey, scope: &Scope) -> Option<ConfigurationValue> {
        self.entries
            .read()
            .get(&(key, scope.clone()))
            .map(|record| record.value.clone())
    }

    /// Full record including write metadata
    pub fn record(&self, key: ConfigurationKey, scope: &Scope) -> Option<OverrideRecord> {
        self.entries.read().get(&(key, scope.clone())).cloned()
    }

    /// Replace the value stored at `(key, scope)`
    pub fn put(
        &self,
        key: ConfigurationKey,
        scope: Scope,
        value: ConfigurationValue,
    ) -> Result<(), ValidationError> {
        self.apply(OverrideRecord::new(key, scope, value, None))
    }

    /// Replace the record at its own address, keeping its metadata
    pub fn apply(&self, record: OverrideRecord) -> Result<(), ValidationError> {
        record.value.validate_for(record.key, &record.scope)?;

        let address = record.address();
        self.entries.write().insert(address.clone(), record);
        self.dirty.lock().insert(address);
        Ok(())
    }

    /// Load persisted records without marking anything dirty.
    /// Records that no longer validate are skipped. Returns how many were loaded.
    pub fn hydrate(&self, records: impl IntoIterator<Item = OverrideRecord>) -> usize {
        let mut entries = self.entries.write();
        let mut loaded = 0;

        for record in records {
            if let Err(e) = record.value.validate_for(record.key, &record.scope) {
                log::warn!("Skipping stored configuration: {}", e);
                continue;
            }
            entries.insert(record.address(), record);
            loaded += 1;
        }

        loaded
    }

    /// All records in `(key, scope)` order
    pub fn records(&self) -> Vec<OverrideRecord> {
        self.entries.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn is_dirty(&self, key: ConfigurationKey, scope: &Scope) -> bool {
        self.dirty.lock().contains(&(key, scope.clone()))
    }

    /// Async lock serializing persist-then-apply for one address.
    /// Lock entries live as long as the store; addresses are bounded by keys times entities.
    pub fn write_lock(&self, key: ConfigurationKey, scope: &Scope) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.write_locks.lock().entry((key, scope.clone())).or_default())
    }

    /// Drain the set of addresses written since the last call
    pub fn take_dirty(&self) -> Vec<(ConfigurationKey, Scope)> {
        std::mem::take(&mut *self.dirty.lock()).into_iter().collect()
    }

    pub fn hidden_set(&self, key: ConfigurationKey, scope: &Scope) -> Option<BTreeSet<String>> {
        self.get(key, scope)
            .and_then(|value| value.as_set().cloned())
    }

    pub fn ordered_list(&self, key: ConfigurationKey, scope: &Scope) -> Option<Vec<String>> {
        self.get(key, scope)
            .and_then(|value| value.as_ordered_list().map(<[String]>::to_vec))
    }

    pub fn label_map(
        &self,
        key: ConfigurationKey,
        scope: &Scope,
    ) -> Option<BTreeMap<String, String>> {
        self.get(key, scope)
            .and_then(|value| value.as_label_map().cloned())
    }

    pub fn template(&self, key: ConfigurationKey, scope: &Scope) -> Option<RelationTemplate> {
        self.get(key, scope)
            .and_then(|value| value.as_template().cloned())
    }

    pub fn diction(&self, key: ConfigurationKey, scope: &Scope) -> Option<EntityDiction> {
        self.get(key, scope)
            .and_then(|value| value.as_diction().cloned())
    }
}
