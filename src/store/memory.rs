use anyhow::{bail, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::model::{ConfigurationKey, OverrideRecord, Scope};
use crate::store::traits::ConfigurationPersistence;

/// Process-local persistence, used when no database is configured and in tests.
///
/// Writes can be made to fail on demand to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<(ConfigurationKey, Scope), OverrideRecord>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = OverrideRecord>) -> Self {
        let store = Self::new();
        store
            .records
            .write()
            .extend(records.into_iter().map(|record| (record.address(), record)));
        store
    }

    /// Make every following write fail until switched back off
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ConfigurationPersistence for MemoryStore {
    async fn read(&self, key: ConfigurationKey, scope: &Scope) -> Result<Option<OverrideRecord>> {
        Ok(self.records.read().get(&(key, scope.clone())).cloned())
    }

    async fn write(&self, record: OverrideRecord) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!(
                "memory store rejected write of '{}' for {}",
                record.key,
                record.scope
            );
        }

        self.records.write().insert(record.address(), record);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<OverrideRecord>> {
        Ok(self.records.read().values().cloned().collect())
    }
}
