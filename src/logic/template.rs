//! Relation reference templates such as `{firstName} {lastName}`.
//!
//! Rendering is a single left-to-right pass. Substituted values are copied
//! verbatim and never scanned again, so a value containing braces cannot
//! expand further.

use itertools::Itertools;
use std::collections::BTreeMap;

use crate::model::{non_blank, RelationTemplate};

const OPEN: char = '{';
const CLOSE: char = '}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    /// `raw` includes the braces, `name` is the trimmed inner text
    Placeholder { name: &'a str, raw: &'a str },
}

fn scan(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut open: Option<usize> = None;

    for (idx, ch) in template.char_indices() {
        match ch {
            // An earlier unmatched brace stays part of the text run
            OPEN => open = Some(idx),
            CLOSE => {
                if let Some(start) = open.take() {
                    if text_start < start {
                        segments.push(Segment::Text(&template[text_start..start]));
                    }
                    segments.push(Segment::Placeholder {
                        name: template[start + OPEN.len_utf8()..idx].trim(),
                        raw: &template[start..idx + CLOSE.len_utf8()],
                    });
                    text_start = idx + CLOSE.len_utf8();
                }
            }
            _ => {}
        }
    }

    if text_start < template.len() {
        segments.push(Segment::Text(&template[text_start..]));
    }
    segments
}

/// Substitute every `{field}` with its value. Unknown or empty placeholders
/// are kept as literal text.
pub fn render(template: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());

    for segment in scan(template) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Placeholder { name, raw } => match values.get(name) {
                Some(value) if !name.is_empty() => out.push_str(value),
                _ => out.push_str(raw),
            },
        }
    }

    out
}

/// Field names referenced by the template, first occurrence order
pub fn placeholders(template: &str) -> Vec<&str> {
    scan(template)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Placeholder { name, .. } if !name.is_empty() => Some(name),
            _ => None,
        })
        .unique()
        .collect()
}

/// Placeholders naming fields the entity does not have
pub fn unknown_placeholders<'t>(template: &'t str, fields: &[String]) -> Vec<&'t str> {
    placeholders(template)
        .into_iter()
        .filter(|name| !fields.iter().any(|field| field == name))
        .collect()
}

/// Human-readable reference to one record.
///
/// Falls back to the record id when no template is configured or the
/// template renders to blank text.
pub fn render_reference(
    template: Option<&RelationTemplate>,
    values: &BTreeMap<String, String>,
    id: &str,
) -> String {
    let Some(format) = non_blank(template.map(|t| t.format.as_str())) else {
        return id.to_string();
    };

    let rendered = render(format, values);
    if rendered.trim().is_empty() {
        id.to_string()
    } else {
        rendered
    }
}

/// Flatten JSON record values into template strings. Nulls are dropped so
/// they render as unresolved placeholders.
pub fn stringify_values(values: &BTreeMap<String, serde_json::Value>) -> BTreeMap<String, String> {
    values
        .iter()
        .filter_map(|(name, value)| {
            let text = match value {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((name.clone(), text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_known_fields() {
        let rendered = render(
            "{firstName} {lastName}",
            &values(&[("firstName", "Ada"), ("lastName", "Lovelace")]),
        );
        assert_eq!(rendered, "Ada Lovelace");
    }

    #[test]
    fn test_unknown_placeholder_stays_visible() {
        assert_eq!(render("{missing}", &BTreeMap::new()), "{missing}");
        assert_eq!(
            render("{ name } <{email}>", &values(&[("name", "Ada")])),
            "Ada <{email}>"
        );
    }

    #[test]
    fn test_malformed_braces_are_literal() {
        let v = values(&[("a", "A"), ("b", "B")]);
        assert_eq!(render("{a", &v), "{a");
        assert_eq!(render("a}", &v), "a}");
        assert_eq!(render("{}", &v), "{}");
        assert_eq!(render("{a{b}", &v), "{aB");
        assert_eq!(render("}{a}{", &v), "}A{");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let v = values(&[("a", "{b}"), ("b", "boom")]);
        assert_eq!(render("{a}", &v), "{b}");
    }

    #[test]
    fn test_multibyte_text_around_placeholders() {
        let v = values(&[("name", "Zoë")]);
        assert_eq!(render("» {name} «", &v), "» Zoë «");
    }

    #[test]
    fn test_placeholders_and_unknowns() {
        let template = "{firstName} {lastName} ({firstName}) {nickname}";
        assert_eq!(
            placeholders(template),
            vec!["firstName", "lastName", "nickname"]
        );

        let fields = vec!["firstName".to_string(), "lastName".to_string()];
        assert_eq!(unknown_placeholders(template, &fields), vec!["nickname"]);
    }

    #[test]
    fn test_render_reference_falls_back_to_id() {
        let v = values(&[("name", "Ada")]);
        assert_eq!(render_reference(None, &v, "42"), "42");
        assert_eq!(
            render_reference(Some(&RelationTemplate::new("  ")), &v, "42"),
            "42"
        );
        assert_eq!(
            render_reference(Some(&RelationTemplate::new("{name}")), &v, "42"),
            "Ada"
        );
        let blank = values(&[("name", " ")]);
        assert_eq!(
            render_reference(Some(&RelationTemplate::new("{name}")), &blank, "42"),
            "42"
        );
    }

    #[test]
    fn test_stringify_values() {
        let raw: BTreeMap<String, serde_json::Value> = [
            ("name".to_string(), json!("Ada")),
            ("age".to_string(), json!(36)),
            ("deleted".to_string(), json!(null)),
        ]
        .into();

        let flat = stringify_values(&raw);
        assert_eq!(flat.get("name").map(String::as_str), Some("Ada"));
        assert_eq!(flat.get("age").map(String::as_str), Some("36"));
        assert!(!flat.contains_key("deleted"));
    }
}
