use serde::{Deserialize, Serialize};

use crate::model::EntityDiction;

/// Introspected description of the database, as handed over by the schema layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub entities: Vec<EntitySchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    #[serde(default)]
    pub diction: Option<EntityDiction>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub relations: Vec<RelationSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// A relation to another entity, named after the related table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSchema {
    pub table: String,
    #[serde(default)]
    pub label: Option<String>,
}

fn default_field_type() -> String {
    "text".to_string()
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diction: None,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        self.fields.push(FieldSchema {
            name: name.into(),
            field_type: field_type.into(),
            label: None,
        });
        self
    }

    pub fn with_relation(mut self, table: impl Into<String>) -> Self {
        self.relations.push(RelationSchema {
            table: table.into(),
            label: None,
        });
        self
    }

    pub fn with_diction(mut self, singular: &str, plural: &str) -> Self {
        self.diction = Some(EntityDiction::new(singular, plural));
        self
    }
}
