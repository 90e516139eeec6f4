use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::logic::field_types::{effective_type, DEFAULT_FIELD_TYPE};
use crate::logic::label::resolve_diction;
use crate::logic::merge::{merge_list, ListOverrides};
use crate::logic::template::render_reference;
use crate::model::{ConfigurationKey, EntityDiction, Item, MergedView, Scope};
use crate::store::{ConfigurationStore, SchemaProvider};

/// A table column or details field with its display label and effective type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsView {
    pub fields: Vec<FieldView>,
    pub hidden: Vec<FieldView>,
}

/// Derived read views: schema lists with the stored overrides merged in.
///
/// Every view reads a fresh snapshot from the store, so callers recompute
/// after an invalidation instead of holding on to old results.
pub struct EntityViews<'a> {
    store: &'a ConfigurationStore,
    schema: &'a dyn SchemaProvider,
}

impl<'a> EntityViews<'a> {
    pub fn new(store: &'a ConfigurationStore, schema: &'a dyn SchemaProvider) -> Self {
        Self { store, schema }
    }

    pub fn diction(&self, entity: &str) -> EntityDiction {
        let stored = self
            .store
            .diction(ConfigurationKey::EntityDiction, &Scope::entity(entity));
        let schema = self.schema.diction(entity);
        resolve_diction(entity, stored.as_ref(), schema.as_ref())
    }

    /// Entities shown in the navigation menu, labeled with their plural names
    pub fn entities_menu(&self) -> MergedView {
        let entities: Vec<Item> = self.schema.entities().into_iter().map(Item::new).collect();
        let hidden = self
            .store
            .hidden_set(ConfigurationKey::EntitiesToHideFromMenu, &Scope::Global);
        let order = self
            .store
            .ordered_list(ConfigurationKey::EntitiesOrder, &Scope::Global);

        merge_list(
            &entities,
            ListOverrides::none()
                .hidden(hidden.as_ref())
                .order(order.as_deref()),
            |entity| Some(self.diction(entity).plural),
        )
    }

    /// Relations of `entity`, labeled by override, then schema label, then
    /// the related entity's plural name
    pub fn entity_relations(&self, entity: &str) -> MergedView {
        let scope = Scope::entity(entity);
        let relations: Vec<Item> = self
            .schema
            .relations(entity)
            .into_iter()
            .map(|relation| {
                let item = Item::new(relation.table);
                match relation.label {
                    Some(label) => item.with_diction(label),
                    None => item,
                }
            })
            .collect();

        let hidden = self
            .store
            .hidden_set(ConfigurationKey::HiddenEntityRelations, &scope);
        let order = self
            .store
            .ordered_list(ConfigurationKey::EntityRelationsOrder, &scope);
        let labels = self
            .store
            .label_map(ConfigurationKey::EntityRelationsLabels, &scope);

        let full_by_value: BTreeMap<&str, &Item> =
            relations.iter().map(|item| (item.value.as_str(), item)).collect();

        merge_list(
            &relations,
            ListOverrides::none()
                .hidden(hidden.as_ref())
                .order(order.as_deref())
                .labels(labels.as_ref()),
            |table| {
                full_by_value
                    .get(table)
                    .and_then(|item| item.diction.clone())
                    .or_else(|| Some(self.diction(table).plural))
            },
        )
    }

    pub fn entity_table_columns(&self, entity: &str) -> FieldsView {
        self.fields_view(entity, ConfigurationKey::HiddenEntityTableColumns)
    }

    pub fn entity_details_fields(&self, entity: &str) -> FieldsView {
        self.fields_view(entity, ConfigurationKey::HiddenEntityDetailsColumns)
    }

    /// Fields shown on the create form
    pub fn entity_create_fields(&self, entity: &str) -> FieldsView {
        self.fields_view(entity, ConfigurationKey::HiddenEntityCreateColumns)
    }

    /// Fields shown on the edit form
    pub fn entity_update_fields(&self, entity: &str) -> FieldsView {
        self.fields_view(entity, ConfigurationKey::HiddenEntityUpdateColumns)
    }

    fn fields_view(&self, entity: &str, hidden_key: ConfigurationKey) -> FieldsView {
        let scope = Scope::entity(entity);
        let schema_fields = self.schema.fields(entity);
        let fields: Vec<Item> = schema_fields
            .iter()
            .map(|field| match &field.label {
                Some(label) => Item::new(field.name.clone()).with_diction(label.clone()),
                None => Item::new(field.name.clone()),
            })
            .collect();

        let hidden = self.store.hidden_set(hidden_key, &scope);
        let order = self
            .store
            .ordered_list(ConfigurationKey::EntityFieldsOrders, &scope);
        let labels = self
            .store
            .label_map(ConfigurationKey::EntityColumnsLabels, &scope);
        let types = self
            .store
            .label_map(ConfigurationKey::EntityColumnsTypes, &scope)
            .unwrap_or_default();

        let schema_types: BTreeMap<&str, &str> = schema_fields
            .iter()
            .map(|field| (field.name.as_str(), field.field_type.as_str()))
            .collect();
        let typed = |name: String, label: String| {
            let base = schema_types
                .get(name.as_str())
                .copied()
                .unwrap_or(DEFAULT_FIELD_TYPE);
            let field_type = effective_type(base, types.get(&name).map(String::as_str)).to_string();
            FieldView {
                name,
                label,
                field_type,
            }
        };

        let merged = merge_list(
            &fields,
            ListOverrides::none()
                .hidden(hidden.as_ref())
                .order(order.as_deref())
                .labels(labels.as_ref()),
            |_| None,
        );

        FieldsView {
            fields: merged
                .visible
                .into_iter()
                .map(|item| typed(item.value, item.label))
                .collect(),
            hidden: merged
                .hidden
                .into_iter()
                .map(|item| typed(item.value, item.label))
                .collect(),
        }
    }

    /// Reference label for one record of `entity`
    pub fn entity_reference(&self, entity: &str, id: &str, values: &BTreeMap<String, String>) -> String {
        let template = self
            .store
            .template(ConfigurationKey::EntityRelationTemplate, &Scope::entity(entity));
        render_reference(template.as_ref(), values, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConfigurationValue, EntitySchema, RelationTemplate};
    use crate::store::StaticSchema;

    fn schema() -> StaticSchema {
        StaticSchema::from_entities(vec![
            EntitySchema::new("users")
                .with_diction("User", "Users")
                .with_field("id", "number")
                .with_field("name", "text")
                .with_field("email", "text")
                .with_field("createdAt", "datetime")
                .with_relation("posts")
                .with_relation("comments")
                .with_relation("sessions"),
            EntitySchema::new("posts").with_diction("Post", "Posts"),
            EntitySchema::new("comments"),
            EntitySchema::new("sessions"),
        ])
    }

    fn users() -> Scope {
        Scope::entity("users")
    }

    #[test]
    fn test_menu_without_overrides() {
        let store = ConfigurationStore::new();
        let schema = schema();
        let views = EntityViews::new(&store, &schema);

        let menu = views.entities_menu();
        assert_eq!(menu.values(), vec!["users", "posts", "comments", "sessions"]);
        assert_eq!(menu.labels(), vec!["Users", "Posts", "comments", "sessions"]);
    }

    #[test]
    fn test_menu_with_hidden_order_and_diction_override() {
        let store = ConfigurationStore::new();
        store
            .put(
                ConfigurationKey::EntitiesToHideFromMenu,
                Scope::Global,
                ConfigurationValue::set(["sessions"]),
            )
            .unwrap();
        store
            .put(
                ConfigurationKey::EntitiesOrder,
                Scope::Global,
                ConfigurationValue::ordered_list(["comments", "dropped_table", "users"]),
            )
            .unwrap();
        store
            .put(
                ConfigurationKey::EntityDiction,
                Scope::entity("comments"),
                ConfigurationValue::Diction(EntityDiction::new("Remark", "Remarks")),
            )
            .unwrap();
        let schema = schema();
        let views = EntityViews::new(&store, &schema);

        let menu = views.entities_menu();
        assert_eq!(menu.values(), vec!["comments", "users", "posts"]);
        assert_eq!(menu.labels(), vec!["Remarks", "Users", "Posts"]);
        assert_eq!(menu.hidden[0].value, "sessions");
    }

    #[test]
    fn test_relations_view() {
        let store = ConfigurationStore::new();
        store
            .put(
                ConfigurationKey::HiddenEntityRelations,
                users(),
                ConfigurationValue::set(["sessions"]),
            )
            .unwrap();
        store
            .put(
                ConfigurationKey::EntityRelationsOrder,
                users(),
                ConfigurationValue::ordered_list(["comments"]),
            )
            .unwrap();
        store
            .put(
                ConfigurationKey::EntityRelationsLabels,
                users(),
                ConfigurationValue::label_map([("comments", "Feedback")]),
            )
            .unwrap();
        let schema = schema();
        let views = EntityViews::new(&store, &schema);

        let relations = views.entity_relations("users");
        assert_eq!(relations.values(), vec!["comments", "posts"]);
        assert_eq!(relations.labels(), vec!["Feedback", "Posts"]);
    }

    #[test]
    fn test_table_columns_and_details_fields_use_separate_hidden_sets() {
        let store = ConfigurationStore::new();
        store
            .put(
                ConfigurationKey::HiddenEntityTableColumns,
                users(),
                ConfigurationValue::set(["email"]),
            )
            .unwrap();
        store
            .put(
                ConfigurationKey::EntityColumnsLabels,
                users(),
                ConfigurationValue::label_map([("createdAt", "Created On")]),
            )
            .unwrap();
        store
            .put(
                ConfigurationKey::EntityColumnsTypes,
                users(),
                ConfigurationValue::label_map([("email", "email")]),
            )
            .unwrap();
        store
            .put(
                ConfigurationKey::EntityFieldsOrders,
                users(),
                ConfigurationValue::ordered_list(["createdAt"]),
            )
            .unwrap();
        let schema = schema();
        let views = EntityViews::new(&store, &schema);

        let columns = views.entity_table_columns("users");
        let names: Vec<&str> = columns.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["createdAt", "id", "name"]);
        assert_eq!(columns.fields[0].label, "Created On");
        assert_eq!(columns.fields[0].field_type, "datetime");
        assert_eq!(columns.hidden[0].field_type, "email");

        let details = views.entity_details_fields("users");
        assert_eq!(details.fields.len(), 4);
        assert!(details.hidden.is_empty());
    }

    #[test]
    fn test_form_fields_have_their_own_hidden_sets() {
        let store = ConfigurationStore::new();
        store
            .put(
                ConfigurationKey::HiddenEntityCreateColumns,
                users(),
                ConfigurationValue::set(["id", "createdAt"]),
            )
            .unwrap();
        store
            .put(
                ConfigurationKey::HiddenEntityUpdateColumns,
                users(),
                ConfigurationValue::set(["id"]),
            )
            .unwrap();
        let schema = schema();
        let views = EntityViews::new(&store, &schema);

        let create: Vec<String> = views
            .entity_create_fields("users")
            .fields
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(create, vec!["name", "email"]);

        let update = views.entity_update_fields("users");
        assert_eq!(update.fields.len(), 3);
        assert_eq!(update.hidden[0].name, "id");
        assert_eq!(views.entity_table_columns("users").fields.len(), 4);
    }

    #[test]
    fn test_incompatible_stored_type_falls_back_to_schema_type() {
        let store = ConfigurationStore::new();
        // Written before the compatibility check existed
        store
            .put(
                ConfigurationKey::EntityColumnsTypes,
                users(),
                ConfigurationValue::label_map([("id", "email"), ("name", "url")]),
            )
            .unwrap();
        let schema = schema();
        let views = EntityViews::new(&store, &schema);

        let details = views.entity_details_fields("users");
        assert_eq!(details.fields[0].field_type, "number");
        assert_eq!(details.fields[1].field_type, "url");
    }

    #[test]
    fn test_unknown_entity_views_are_empty() {
        let store = ConfigurationStore::new();
        let schema = schema();
        let views = EntityViews::new(&store, &schema);

        assert_eq!(views.entity_relations("ghosts"), MergedView::default());
        assert_eq!(views.entity_table_columns("ghosts"), FieldsView::default());
    }

    #[test]
    fn test_reference_uses_stored_template() {
        let store = ConfigurationStore::new();
        let schema = schema();
        let values: BTreeMap<String, String> = [
            ("name".to_string(), "Ada".to_string()),
            ("email".to_string(), "ada@example.com".to_string()),
        ]
        .into();

        let views = EntityViews::new(&store, &schema);
        assert_eq!(views.entity_reference("users", "7", &values), "7");

        store
            .put(
                ConfigurationKey::EntityRelationTemplate,
                users(),
                ConfigurationValue::Template(RelationTemplate::new("{name} <{email}>")),
            )
            .unwrap();
        assert_eq!(
            views.entity_reference("users", "7", &values),
            "Ada <ada@example.com>"
        );
    }
}
