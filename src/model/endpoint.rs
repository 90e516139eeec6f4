use serde::Serialize;
use std::fmt;

use crate::model::{ConfigurationKey, Scope};

/// A derived read endpoint whose cached response depends on stored configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "endpoint", rename_all = "snake_case")]
pub enum EndpointRef {
    /// The projection of a single `(key, scope)` value
    Configuration { key: ConfigurationKey, scope: Scope },
    EntitiesMenu,
    EntityRelations { entity: String },
    EntityTableColumns { entity: String },
    EntityDetailsFields { entity: String },
    EntityCreateFields { entity: String },
    EntityUpdateFields { entity: String },
    EntityReference { entity: String },
}

impl EndpointRef {
    pub fn configuration(key: ConfigurationKey, scope: Scope) -> Self {
        EndpointRef::Configuration { key, scope }
    }

    /// HTTP path serving this view
    pub fn path(&self) -> String {
        match self {
            EndpointRef::Configuration {
                key,
                scope: Scope::Global,
            } => format!("/configurations/{}", key),
            EndpointRef::Configuration {
                key,
                scope: Scope::Entity(entity),
            } => format!("/configurations/{}/{}", key, entity),
            EndpointRef::EntitiesMenu => "/entities/menu".to_string(),
            EndpointRef::EntityRelations { entity } => format!("/entities/{}/relations", entity),
            EndpointRef::EntityTableColumns { entity } => format!("/entities/{}/columns", entity),
            EndpointRef::EntityDetailsFields { entity } => {
                format!("/entities/{}/details-fields", entity)
            }
            EndpointRef::EntityCreateFields { entity } => {
                format!("/entities/{}/create-fields", entity)
            }
            EndpointRef::EntityUpdateFields { entity } => {
                format!("/entities/{}/update-fields", entity)
            }
            EndpointRef::EntityReference { entity } => format!("/entities/{}/reference", entity),
        }
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
