use std::collections::BTreeMap;

use crate::model::{non_blank, ConfigurationKey, FieldSchema, ValidationError};

/// Type a field falls back to when the schema does not say
pub const DEFAULT_FIELD_TYPE: &str = "text";

const TEXT_FAMILY: &[&str] = &[
    "text",
    "textarea",
    "rich-text",
    "email",
    "url",
    "color",
    "image",
    "password",
    "selection",
];

const NUMBER_FAMILY: &[&str] = &["number", "selection"];

/// Types a field of schema type `base` may be narrowed to, `base` included.
///
/// Types without sister types (boolean, date, enum, ...) only admit themselves.
pub fn sister_types(base: &str) -> Vec<&str> {
    match base {
        "text" => TEXT_FAMILY.to_vec(),
        "number" => NUMBER_FAMILY.to_vec(),
        other => vec![other],
    }
}

pub fn is_compatible(base: &str, requested: &str) -> bool {
    requested == base || sister_types(base).contains(&requested)
}

/// Effective type of a field: a compatible override, else the schema type
pub fn effective_type<'a>(base: &'a str, requested: Option<&'a str>) -> &'a str {
    match non_blank(requested) {
        Some(requested) if is_compatible(base, requested) => requested,
        Some(requested) => {
            log::debug!("Ignoring stored type '{}' for a '{}' field", requested, base);
            base
        }
        None => base,
    }
}

/// Reject type overrides a field's schema type cannot be narrowed to.
///
/// Blank overrides reset to the schema type. Names the schema does not
/// know are left alone, the merge drops them on read.
pub fn check_type_overrides(
    entity: &str,
    fields: &[FieldSchema],
    overrides: &BTreeMap<String, String>,
) -> Result<(), ValidationError> {
    for (name, requested) in overrides {
        let Some(requested) = non_blank(Some(requested.as_str())) else {
            continue;
        };
        let Some(field) = fields.iter().find(|field| &field.name == name) else {
            continue;
        };
        if !is_compatible(&field.field_type, requested) {
            return Err(ValidationError::IncompatibleType {
                key: ConfigurationKey::EntityColumnsTypes,
                field: format!("{}.{}", entity, name),
                base: field.field_type.clone(),
                requested: requested.to_string(),
            });
        }
    }
    Ok(())
}
