use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::model::{fingerprint, now, EndpointRef, Timestamp, ValidationError};

/// Every configuration the admin panel knows how to store.
///
/// Keys are closed: each one declares the shape of its value and whether it
/// lives under a specific entity or globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationKey {
    EntitiesToHideFromMenu,
    EntitiesOrder,
    EntityDiction,
    EntityColumnsLabels,
    EntityColumnsTypes,
    EntityFieldsOrders,
    HiddenEntityTableColumns,
    HiddenEntityDetailsColumns,
    HiddenEntityCreateColumns,
    HiddenEntityUpdateColumns,
    EntityRelationsLabels,
    EntityRelationTemplate,
    HiddenEntityRelations,
    EntityRelationsOrder,
}

impl ConfigurationKey {
    pub const ALL: [ConfigurationKey; 14] = [
        ConfigurationKey::EntitiesToHideFromMenu,
        ConfigurationKey::EntitiesOrder,
        ConfigurationKey::EntityDiction,
        ConfigurationKey::EntityColumnsLabels,
        ConfigurationKey::EntityColumnsTypes,
        ConfigurationKey::EntityFieldsOrders,
        ConfigurationKey::HiddenEntityTableColumns,
        ConfigurationKey::HiddenEntityDetailsColumns,
        ConfigurationKey::HiddenEntityCreateColumns,
        ConfigurationKey::HiddenEntityUpdateColumns,
        ConfigurationKey::EntityRelationsLabels,
        ConfigurationKey::EntityRelationTemplate,
        ConfigurationKey::HiddenEntityRelations,
        ConfigurationKey::EntityRelationsOrder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigurationKey::EntitiesToHideFromMenu => "entities_to_hide_from_menu",
            ConfigurationKey::EntitiesOrder => "entities_order",
            ConfigurationKey::EntityDiction => "entity_diction",
            ConfigurationKey::EntityColumnsLabels => "entity_columns_labels",
            ConfigurationKey::EntityColumnsTypes => "entity_columns_types",
            ConfigurationKey::EntityFieldsOrders => "entity_fields_orders",
            ConfigurationKey::HiddenEntityTableColumns => "hidden_entity_table_columns",
            ConfigurationKey::HiddenEntityDetailsColumns => "hidden_entity_details_columns",
            ConfigurationKey::HiddenEntityCreateColumns => "hidden_entity_create_columns",
            ConfigurationKey::HiddenEntityUpdateColumns => "hidden_entity_update_columns",
            ConfigurationKey::EntityRelationsLabels => "entity_relations_labels",
            ConfigurationKey::EntityRelationTemplate => "entity_relation_template",
            ConfigurationKey::HiddenEntityRelations => "hidden_entity_relations",
            ConfigurationKey::EntityRelationsOrder => "entity_relations_order",
        }
    }

    /// The value shape this key accepts
    pub fn shape(&self) -> ValueShape {
        match self {
            ConfigurationKey::EntitiesToHideFromMenu
            | ConfigurationKey::HiddenEntityTableColumns
            | ConfigurationKey::HiddenEntityDetailsColumns
            | ConfigurationKey::HiddenEntityCreateColumns
            | ConfigurationKey::HiddenEntityUpdateColumns
            | ConfigurationKey::HiddenEntityRelations => ValueShape::Set,
            ConfigurationKey::EntitiesOrder
            | ConfigurationKey::EntityFieldsOrders
            | ConfigurationKey::EntityRelationsOrder => ValueShape::OrderedList,
            ConfigurationKey::EntityColumnsLabels
            | ConfigurationKey::EntityColumnsTypes
            | ConfigurationKey::EntityRelationsLabels => ValueShape::LabelMap,
            ConfigurationKey::EntityRelationTemplate => ValueShape::Template,
            ConfigurationKey::EntityDiction => ValueShape::Diction,
        }
    }

    /// Whether values for this key are stored per entity rather than globally
    pub fn is_entity_scoped(&self) -> bool {
        !matches!(
            self,
            ConfigurationKey::EntitiesToHideFromMenu | ConfigurationKey::EntitiesOrder
        )
    }

    pub fn accepts_scope(&self, scope: &Scope) -> bool {
        self.is_entity_scoped() == scope.is_entity()
    }

    /// Derived read views that embed this configuration and must be
    /// refetched after it changes.
    pub fn embedding_endpoints(&self, scope: &Scope) -> Vec<EndpointRef> {
        let entity = match scope {
            Scope::Global => {
                return match self {
                    ConfigurationKey::EntitiesToHideFromMenu | ConfigurationKey::EntitiesOrder => {
                        vec![EndpointRef::EntitiesMenu]
                    }
                    _ => Vec::new(),
                }
            }
            Scope::Entity(entity) => entity.clone(),
        };

        match self {
            ConfigurationKey::EntitiesToHideFromMenu | ConfigurationKey::EntitiesOrder => Vec::new(),
            ConfigurationKey::EntityDiction => vec![EndpointRef::EntitiesMenu],
            ConfigurationKey::EntityColumnsLabels
            | ConfigurationKey::EntityColumnsTypes
            | ConfigurationKey::EntityFieldsOrders => vec![
                EndpointRef::EntityTableColumns {
                    entity: entity.clone(),
                },
                EndpointRef::EntityDetailsFields {
                    entity: entity.clone(),
                },
                EndpointRef::EntityCreateFields {
                    entity: entity.clone(),
                },
                EndpointRef::EntityUpdateFields { entity },
            ],
            ConfigurationKey::HiddenEntityTableColumns => {
                vec![EndpointRef::EntityTableColumns { entity }]
            }
            ConfigurationKey::HiddenEntityDetailsColumns => {
                vec![EndpointRef::EntityDetailsFields { entity }]
            }
            ConfigurationKey::HiddenEntityCreateColumns => {
                vec![EndpointRef::EntityCreateFields { entity }]
            }
            ConfigurationKey::HiddenEntityUpdateColumns => {
                vec![EndpointRef::EntityUpdateFields { entity }]
            }
            ConfigurationKey::EntityRelationsLabels
            | ConfigurationKey::HiddenEntityRelations
            | ConfigurationKey::EntityRelationsOrder => {
                vec![EndpointRef::EntityRelations { entity }]
            }
            ConfigurationKey::EntityRelationTemplate => {
                vec![EndpointRef::EntityReference { entity }]
            }
        }
    }
}

impl fmt::Display for ConfigurationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigurationKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigurationKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    Set,
    OrderedList,
    LabelMap,
    Template,
    Diction,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueShape::Set => "set",
            ValueShape::OrderedList => "ordered list",
            ValueShape::LabelMap => "label map",
            ValueShape::Template => "template",
            ValueShape::Diction => "diction",
        };
        f.write_str(name)
    }
}

/// Where a configuration value applies.
///
/// On the wire and in storage the global scope is the empty entity name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    Global,
    Entity(String),
}

impl Scope {
    pub fn entity(name: impl Into<String>) -> Self {
        Scope::from(name.into())
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, Scope::Entity(_))
    }

    pub fn entity_name(&self) -> Option<&str> {
        match self {
            Scope::Global => None,
            Scope::Entity(name) => Some(name),
        }
    }

    /// Column value used by persistence adapters
    pub fn storage_key(&self) -> &str {
        self.entity_name().unwrap_or("")
    }
}

impl From<String> for Scope {
    fn from(value: String) -> Self {
        if value.trim().is_empty() {
            Scope::Global
        } else {
            Scope::Entity(value)
        }
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Global => String::new(),
            Scope::Entity(name) => name,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global scope"),
            Scope::Entity(name) => write!(f, "entity '{}'", name),
        }
    }
}

/// Reference template used to label records of an entity, e.g. `{firstName} {lastName}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTemplate {
    #[serde(default)]
    pub format: String,
}

impl RelationTemplate {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDiction {
    #[serde(default)]
    pub singular: String,
    #[serde(default)]
    pub plural: String,
}

impl EntityDiction {
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
        }
    }
}

/// A stored override value, one variant per declared shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "value", rename_all = "snake_case")]
pub enum ConfigurationValue {
    Set(BTreeSet<String>),
    OrderedList(Vec<String>),
    LabelMap(BTreeMap<String, String>),
    Template(RelationTemplate),
    Diction(EntityDiction),
}

impl ConfigurationValue {
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        ConfigurationValue::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn ordered_list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        ConfigurationValue::OrderedList(items.into_iter().map(Into::into).collect())
    }

    pub fn label_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ConfigurationValue::LabelMap(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn shape(&self) -> ValueShape {
        match self {
            ConfigurationValue::Set(_) => ValueShape::Set,
            ConfigurationValue::OrderedList(_) => ValueShape::OrderedList,
            ConfigurationValue::LabelMap(_) => ValueShape::LabelMap,
            ConfigurationValue::Template(_) => ValueShape::Template,
            ConfigurationValue::Diction(_) => ValueShape::Diction,
        }
    }

    /// Decode the raw JSON form of a value using the shape declared by `key`
    pub fn from_json(
        key: ConfigurationKey,
        value: serde_json::Value,
    ) -> Result<Self, ValidationError> {
        let malformed = |e: serde_json::Error| ValidationError::Malformed {
            key,
            reason: e.to_string(),
        };

        let decoded = match key.shape() {
            ValueShape::Set => ConfigurationValue::Set(serde_json::from_value(value).map_err(malformed)?),
            ValueShape::OrderedList => {
                ConfigurationValue::OrderedList(serde_json::from_value(value).map_err(malformed)?)
            }
            ValueShape::LabelMap => {
                ConfigurationValue::LabelMap(serde_json::from_value(value).map_err(malformed)?)
            }
            ValueShape::Template => {
                ConfigurationValue::Template(serde_json::from_value(value).map_err(malformed)?)
            }
            ValueShape::Diction => {
                ConfigurationValue::Diction(serde_json::from_value(value).map_err(malformed)?)
            }
        };

        Ok(decoded)
    }

    /// Raw JSON form, without the shape tag
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigurationValue::Set(items) => serde_json::json!(items),
            ConfigurationValue::OrderedList(items) => serde_json::json!(items),
            ConfigurationValue::LabelMap(labels) => serde_json::json!(labels),
            ConfigurationValue::Template(template) => serde_json::json!(template),
            ConfigurationValue::Diction(diction) => serde_json::json!(diction),
        }
    }

    /// Check that this value may be stored under `(key, scope)`
    pub fn validate_for(&self, key: ConfigurationKey, scope: &Scope) -> Result<(), ValidationError> {
        if self.shape() != key.shape() {
            return Err(ValidationError::ShapeMismatch {
                key,
                expected: key.shape(),
                actual: self.shape(),
            });
        }

        // `Scope::Entity` built directly bypasses the empty-means-global rule
        if let Scope::Entity(name) = scope {
            if name.trim().is_empty() {
                return Err(ValidationError::BlankEntity { key });
            }
        }

        if !key.accepts_scope(scope) {
            return Err(ValidationError::ScopeNotAllowed {
                key,
                scope: scope.clone(),
            });
        }

        if let ConfigurationValue::OrderedList(items) = self {
            if let Some(entry) = items.iter().duplicates().next() {
                return Err(ValidationError::DuplicateEntry {
                    key,
                    entry: entry.clone(),
                });
            }
        }

        Ok(())
    }

    /// Stable content hash, used as the HTTP entity tag
    pub fn fingerprint(&self) -> String {
        fingerprint(self.to_json().to_string().as_bytes())
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            ConfigurationValue::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_ordered_list(&self) -> Option<&[String]> {
        match self {
            ConfigurationValue::OrderedList(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_label_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ConfigurationValue::LabelMap(labels) => Some(labels),
            _ => None,
        }
    }

    pub fn as_template(&self) -> Option<&RelationTemplate> {
        match self {
            ConfigurationValue::Template(template) => Some(template),
            _ => None,
        }
    }

    pub fn as_diction(&self) -> Option<&EntityDiction> {
        match self {
            ConfigurationValue::Diction(diction) => Some(diction),
            _ => None,
        }
    }
}

/// The live value for one `(key, scope)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub key: ConfigurationKey,
    pub scope: Scope,
    pub value: ConfigurationValue,
    pub last_written_at: Timestamp,
    pub last_written_by: Option<String>,
}

impl OverrideRecord {
    pub fn new(
        key: ConfigurationKey,
        scope: Scope,
        value: ConfigurationValue,
        author: Option<String>,
    ) -> Self {
        Self {
            key,
            scope,
            value,
            last_written_at: now(),
            last_written_by: author,
        }
    }

    pub fn address(&self) -> (ConfigurationKey, Scope) {
        (self.key, self.scope.clone())
    }
}
