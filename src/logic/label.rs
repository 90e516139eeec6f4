use std::collections::BTreeMap;

use crate::model::{non_blank, EntityDiction};

/// Display label for one item.
///
/// Tries a non-blank entry in `labels`, then non-blank diction, then the raw
/// identifier.
pub fn resolve_label<F>(identifier: &str, labels: Option<&BTreeMap<String, String>>, diction: F) -> String
where
    F: FnOnce(&str) -> Option<String>,
{
    if let Some(label) = non_blank(labels.and_then(|l| l.get(identifier)).map(String::as_str)) {
        return label.to_string();
    }

    if let Some(label) = diction(identifier).filter(|d| !d.trim().is_empty()) {
        return label;
    }

    identifier.to_string()
}

/// Singular and plural names for an entity.
///
/// Each form falls back independently: stored override, then schema
/// diction, then the entity name itself.
pub fn resolve_diction(
    entity: &str,
    stored: Option<&EntityDiction>,
    schema: Option<&EntityDiction>,
) -> EntityDiction {
    let pick = |form: fn(&EntityDiction) -> &str| {
        non_blank(stored.map(form))
            .or_else(|| non_blank(schema.map(form)))
            .unwrap_or(entity)
            .to_string()
    };

    EntityDiction {
        singular: pick(|d| d.singular.as_str()),
        plural: pick(|d| d.plural.as_str()),
    }
}
