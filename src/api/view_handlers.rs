use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::handlers::{ApiError, AppState, ErrorResponse};
use crate::logic::{stringify_values, FieldsView};
use crate::model::MergedView;
use crate::store::ConfigurationPersistence;

#[derive(Debug, Deserialize)]
pub struct ReferenceRequest {
    pub id: String,
    #[serde(default)]
    pub values: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct ReferenceResponse {
    pub label: String,
}

fn ensure_entity<S>(state: &AppState<S>, entity: &str) -> Result<(), ApiError> {
    if state.schema.has_entity(entity) {
        Ok(())
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!("Entity '{}' not found", entity))),
        ))
    }
}

/// GET /entities/menu
pub async fn get_entities_menu<S: ConfigurationPersistence>(
    State(state): State<AppState<S>>,
) -> Json<MergedView> {
    Json(state.views().entities_menu())
}

/// GET /entities/{entity}/relations
pub async fn get_entity_relations<S: ConfigurationPersistence>(
    Path(entity): Path<String>,
    State(state): State<AppState<S>>,
) -> Result<Json<MergedView>, ApiError> {
    ensure_entity(&state, &entity)?;
    Ok(Json(state.views().entity_relations(&entity)))
}

/// GET /entities/{entity}/columns
pub async fn get_entity_table_columns<S: ConfigurationPersistence>(
    Path(entity): Path<String>,
    State(state): State<AppState<S>>,
) -> Result<Json<FieldsView>, ApiError> {
    ensure_entity(&state, &entity)?;
    Ok(Json(state.views().entity_table_columns(&entity)))
}

/// GET /entities/{entity}/details-fields
pub async fn get_entity_details_fields<S: ConfigurationPersistence>(
    Path(entity): Path<String>,
    State(state): State<AppState<S>>,
) -> Result<Json<FieldsView>, ApiError> {
    ensure_entity(&state, &entity)?;
    Ok(Json(state.views().entity_details_fields(&entity)))
}

/// GET /entities/{entity}/create-fields
pub async fn get_entity_create_fields<S: ConfigurationPersistence>(
    Path(entity): Path<String>,
    State(state): State<AppState<S>>,
) -> Result<Json<FieldsView>, ApiError> {
    ensure_entity(&state, &entity)?;
    Ok(Json(state.views().entity_create_fields(&entity)))
}

/// GET /entities/{entity}/update-fields
pub async fn get_entity_update_fields<S: ConfigurationPersistence>(
    Path(entity): Path<String>,
    State(state): State<AppState<S>>,
) -> Result<Json<FieldsView>, ApiError> {
    ensure_entity(&state, &entity)?;
    Ok(Json(state.views().entity_update_fields(&entity)))
}

/// POST /entities/{entity}/reference
/// Render the reference label of one record from its field values
pub async fn render_entity_reference<S: ConfigurationPersistence>(
    Path(entity): Path<String>,
    State(state): State<AppState<S>>,
    RequestJson(req): RequestJson<ReferenceRequest>,
) -> Result<Json<ReferenceResponse>, ApiError> {
    ensure_entity(&state, &entity)?;
    let values = stringify_values(&req.values);
    let label = state.views().entity_reference(&entity, &req.id, &values);
    Ok(Json(ReferenceResponse { label }))
}
