use crate::model::{
    ConfigError, ConfigurationKey, ConfigurationValue, EndpointRef, OverrideRecord, Scope,
};
use crate::store::{ConfigurationPersistence, ConfigurationStore, InvalidationSink};

/// Write path for configuration overrides
pub struct ConfigurationMutations;

impl ConfigurationMutations {
    /// Validate, persist and apply one override, then signal invalidation.
    ///
    /// Writes to the same `(key, scope)` hold that address's write lock from
    /// the persistence write through the store update, so the store applies
    /// them in the order persistence accepted them. The store is touched only
    /// after the write succeeds, so a failed call leaves the previous value
    /// in place. Every address drained from the store's dirty set is signalled
    /// as a configuration projection, then each of `invalidates`.
    pub async fn upsert<P, I>(
        store: &ConfigurationStore,
        persistence: &P,
        sink: &I,
        key: ConfigurationKey,
        scope: Scope,
        value: ConfigurationValue,
        invalidates: &[EndpointRef],
        author: Option<String>,
    ) -> Result<OverrideRecord, ConfigError>
    where
        P: ConfigurationPersistence + ?Sized,
        I: InvalidationSink + ?Sized,
    {
        value.validate_for(key, &scope)?;

        let lock = store.write_lock(key, &scope);
        let _serialized = lock.lock().await;

        let record = OverrideRecord::new(key, scope, value, author);

        persistence
            .write(record.clone())
            .await
            .map_err(ConfigError::Persistence)?;

        store.apply(record.clone())?;

        for (key, scope) in store.take_dirty() {
            sink.invalidate(&EndpointRef::configuration(key, scope));
        }
        for endpoint in invalidates {
            sink.invalidate(endpoint);
        }

        log::info!(
            "Configuration '{}' updated for {} by {}",
            key,
            record.scope,
            record.last_written_by.as_deref().unwrap_or("anonymous")
        );

        Ok(record)
    }

    /// Load every persisted record into the store
    pub async fn hydrate<P>(store: &ConfigurationStore, persistence: &P) -> Result<usize, ConfigError>
    where
        P: ConfigurationPersistence + ?Sized,
    {
        let records = persistence.list().await.map_err(ConfigError::Persistence)?;
        let loaded = store.hydrate(records);
        log::info!("Loaded {} stored configuration values", loaded);
        Ok(loaded)
    }
}
