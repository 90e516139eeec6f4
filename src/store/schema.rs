use anyhow::{Context, Result};
use std::path::Path;

use crate::model::{EntityDiction, EntitySchema, FieldSchema, RelationSchema, SchemaDocument};
use crate::store::traits::SchemaProvider;

/// Schema provider backed by an already-introspected JSON document
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    document: SchemaDocument,
}

impl StaticSchema {
    pub fn new(document: SchemaDocument) -> Self {
        Self { document }
    }

    pub fn from_entities(entities: Vec<EntitySchema>) -> Self {
        Self::new(SchemaDocument { entities })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let document = serde_json::from_str(json).context("Failed to parse schema document")?;
        Ok(Self::new(document))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        Self::from_json_str(&contents)
    }

    fn entity(&self, name: &str) -> Option<&EntitySchema> {
        self.document.entities.iter().find(|entity| entity.name == name)
    }
}

impl SchemaProvider for StaticSchema {
    fn entities(&self) -> Vec<String> {
        self.document
            .entities
            .iter()
            .map(|entity| entity.name.clone())
            .collect()
    }

    fn fields(&self, entity: &str) -> Vec<FieldSchema> {
        self.entity(entity)
            .map(|e| e.fields.clone())
            .unwrap_or_default()
    }

    fn relations(&self, entity: &str) -> Vec<RelationSchema> {
        self.entity(entity)
            .map(|e| e.relations.clone())
            .unwrap_or_default()
    }

    fn diction(&self, entity: &str) -> Option<EntityDiction> {
        self.entity(entity).and_then(|e| e.diction.clone())
    }

    fn has_entity(&self, entity: &str) -> bool {
        self.entity(entity).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let schema = StaticSchema::from_json_str(
            r#"{
                "entities": [
                    {
                        "name": "users",
                        "diction": {"singular": "User", "plural": "Users"},
                        "fields": [{"name": "id", "type": "number"}, {"name": "email"}],
                        "relations": [{"table": "posts"}]
                    },
                    {"name": "posts"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(schema.entities(), vec!["users", "posts"]);
        assert!(schema.has_entity("posts"));
        assert!(!schema.has_entity("comments"));

        let fields = schema.fields("users");
        assert_eq!(fields[0].field_type, "number");
        assert_eq!(fields[1].field_type, "text");
        assert_eq!(schema.relations("users")[0].table, "posts");
        assert_eq!(schema.diction("users").unwrap().plural, "Users");
        assert!(schema.fields("comments").is_empty());
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        assert!(StaticSchema::from_json_str("{\"entities\": 3}").is_err());
    }
}
