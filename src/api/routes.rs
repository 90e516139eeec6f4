use axum::{
    routing::{get, post},
    Router,
};

use crate::api::{handlers, view_handlers};
use crate::api::handlers::AppState;
use crate::store::ConfigurationPersistence;

pub fn create_router<S: ConfigurationPersistence + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Stored overrides
        .route("/configurations", get(handlers::list_configurations::<S>))
        .route(
            "/configurations/:key",
            get(handlers::get_configuration::<S>).put(handlers::upsert_configuration::<S>),
        )
        .route(
            "/configurations/:key/:entity",
            get(handlers::get_entity_configuration::<S>)
                .put(handlers::upsert_entity_configuration::<S>),
        )
        // Derived views
        .route("/entities/menu", get(view_handlers::get_entities_menu::<S>))
        .route(
            "/entities/:entity/relations",
            get(view_handlers::get_entity_relations::<S>),
        )
        .route(
            "/entities/:entity/columns",
            get(view_handlers::get_entity_table_columns::<S>),
        )
        .route(
            "/entities/:entity/details-fields",
            get(view_handlers::get_entity_details_fields::<S>),
        )
        .route(
            "/entities/:entity/create-fields",
            get(view_handlers::get_entity_create_fields::<S>),
        )
        .route(
            "/entities/:entity/update-fields",
            get(view_handlers::get_entity_update_fields::<S>),
        )
        .route(
            "/entities/:entity/reference",
            post(view_handlers::render_entity_reference::<S>),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EndpointRef, EntitySchema};
    use crate::store::{MemoryStore, StaticSchema};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state(persistence: Arc<MemoryStore>) -> AppState<MemoryStore> {
        let schema = StaticSchema::from_entities(vec![
            EntitySchema::new("users")
                .with_diction("User", "Users")
                .with_field("firstName", "text")
                .with_field("lastName", "text")
                .with_relation("posts"),
            EntitySchema::new("posts"),
        ]);
        AppState::new(persistence, Arc::new(schema))
    }

    async fn send(
        state: &AppState<MemoryStore>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", "tester");
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = create_router::<MemoryStore>()
            .with_state(state.clone())
            .oneshot(request)
            .await
            .unwrap();

        let status = response.status();
        let etag = response
            .headers()
            .get(header::ETAG)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, etag, json)
    }

    #[tokio::test]
    async fn test_put_then_get_configuration() {
        let state = state(Arc::new(MemoryStore::new()));
        let mut signals = state.invalidations.subscribe();

        let (status, _, body) = send(
            &state,
            Method::PUT,
            "/configurations/entities_to_hide_from_menu",
            Some(json!(["posts"])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], json!(["posts"]));
        assert_eq!(body["last_written_by"], json!("tester"));

        assert!(matches!(
            signals.recv().await.unwrap(),
            EndpointRef::Configuration { .. }
        ));
        assert_eq!(signals.recv().await.unwrap(), EndpointRef::EntitiesMenu);

        let (status, etag, body) =
            send(&state, Method::GET, "/configurations/entities_to_hide_from_menu", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entity"], Value::Null);
        assert_eq!(etag, Some(format!("\"{}\"", body["fingerprint"].as_str().unwrap())));

        let (_, _, menu) = send(&state, Method::GET, "/entities/menu", None).await;
        assert_eq!(menu["visible"], json!([{"value": "users", "label": "Users"}]));
    }

    #[tokio::test]
    async fn test_missing_configuration_is_not_found() {
        let state = state(Arc::new(MemoryStore::new()));
        let (status, _, _) = send(
            &state,
            Method::GET,
            "/configurations/hidden_entity_relations/users",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_writes_are_rejected() {
        let state = state(Arc::new(MemoryStore::new()));

        let (status, _, _) =
            send(&state, Method::PUT, "/configurations/no_such_key", Some(json!([]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(
            &state,
            Method::PUT,
            "/configurations/entity_columns_labels/users",
            Some(json!(["not", "a", "map"])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = send(
            &state,
            Method::PUT,
            "/configurations/hidden_entity_relations",
            Some(json!(["posts"])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("global scope"));

        assert!(state.configuration.is_empty());
    }

    #[tokio::test]
    async fn test_column_type_must_be_a_sister_type() {
        let state = state(Arc::new(MemoryStore::new()));

        let (status, _, body) = send(
            &state,
            Method::PUT,
            "/configurations/entity_columns_types/users",
            Some(json!({"firstName": "number"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("firstName"));
        assert!(state.configuration.is_empty());

        let (status, _, _) = send(
            &state,
            Method::PUT,
            "/configurations/entity_columns_types/users",
            Some(json!({"firstName": "email"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, _, columns) = send(&state, Method::GET, "/entities/users/create-fields", None).await;
        assert_eq!(columns["fields"][0]["type"], json!("email"));
    }

    #[tokio::test]
    async fn test_persistence_failure_maps_to_bad_gateway() {
        let persistence = Arc::new(MemoryStore::new());
        persistence.set_fail_writes(true);
        let state = state(persistence);

        let (status, _, _) = send(
            &state,
            Method::PUT,
            "/configurations/entities_order",
            Some(json!(["posts", "users"])),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(state.configuration.is_empty());
    }

    #[tokio::test]
    async fn test_reference_rendering() {
        let state = state(Arc::new(MemoryStore::new()));
        send(
            &state,
            Method::PUT,
            "/configurations/entity_relation_template/users",
            Some(json!({"format": "{firstName} {lastName}"})),
        )
        .await;

        let (status, _, body) = send(
            &state,
            Method::POST,
            "/entities/users/reference",
            Some(json!({"id": "1", "values": {"firstName": "Ada", "lastName": "Lovelace"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["label"], json!("Ada Lovelace"));

        let (status, _, _) = send(
            &state,
            Method::POST,
            "/entities/ghosts/reference",
            Some(json!({"id": "1"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
