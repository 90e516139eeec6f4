use serde::{Deserialize, Serialize};

use crate::model::Id;

/// A schema-derived subject of configuration: an entity, field or relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub value: Id,
    /// Default label supplied by the schema layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diction: Option<String>,
}

impl Item {
    pub fn new(value: impl Into<Id>) -> Self {
        Self {
            value: value.into(),
            diction: None,
        }
    }

    pub fn with_diction(mut self, diction: impl Into<String>) -> Self {
        self.diction = Some(diction.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledItem {
    pub value: Id,
    pub label: String,
}

/// Result of merging overrides onto a full item list. Computed on read, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedView {
    pub visible: Vec<LabeledItem>,
    pub hidden: Vec<LabeledItem>,
}

impl MergedView {
    pub fn values(&self) -> Vec<&str> {
        self.visible.iter().map(|item| item.value.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.visible.iter().map(|item| item.label.as_str()).collect()
    }
}
