use anyhow::Result;

use crate::model::{
    ConfigurationKey, EndpointRef, EntityDiction, FieldSchema, OverrideRecord, RelationSchema,
    Scope,
};

/// Durable key-value storage for override records, addressed by `(key, scope)`
#[async_trait::async_trait]
pub trait ConfigurationPersistence: Send + Sync {
    /// Read the live record for a key, if one was ever written
    async fn read(&self, key: ConfigurationKey, scope: &Scope) -> Result<Option<OverrideRecord>>;
    /// Insert or replace the record at its `(key, scope)` address
    async fn write(&self, record: OverrideRecord) -> Result<()>;
    /// Every stored record, used to hydrate the configuration store at startup
    async fn list(&self) -> Result<Vec<OverrideRecord>>;
}

/// Schema-derived item lists. Introspection itself happens elsewhere.
pub trait SchemaProvider: Send + Sync {
    /// Entity names in schema order
    fn entities(&self) -> Vec<String>;
    fn fields(&self, entity: &str) -> Vec<FieldSchema>;
    fn relations(&self, entity: &str) -> Vec<RelationSchema>;
    /// Schema-supplied singular/plural names for an entity
    fn diction(&self, entity: &str) -> Option<EntityDiction>;

    fn has_entity(&self, entity: &str) -> bool {
        self.entities().iter().any(|name| name == entity)
    }
}

/// Receives "refetch this view" signals after a configuration write
pub trait InvalidationSink: Send + Sync {
    fn invalidate(&self, endpoint: &EndpointRef);
}
