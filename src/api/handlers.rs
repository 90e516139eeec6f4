use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    Json as RequestJson,
};
use serde::Serialize;
use std::sync::Arc;

use crate::logic::{check_type_overrides, unknown_placeholders, ConfigurationMutations, EntityViews};
use crate::model::{
    ConfigError, ConfigurationKey, ConfigurationValue, OverrideRecord, Scope, Timestamp,
    UserContext, ValidationError,
};
use crate::store::{ConfigurationPersistence, ConfigurationStore, InvalidationBus, SchemaProvider};

/// Shared state handed to every handler
pub struct AppState<S> {
    pub persistence: Arc<S>,
    pub configuration: Arc<ConfigurationStore>,
    pub schema: Arc<dyn SchemaProvider>,
    pub invalidations: InvalidationBus,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            persistence: Arc::clone(&self.persistence),
            configuration: Arc::clone(&self.configuration),
            schema: Arc::clone(&self.schema),
            invalidations: self.invalidations.clone(),
        }
    }
}

impl<S: ConfigurationPersistence> AppState<S> {
    pub fn new(persistence: Arc<S>, schema: Arc<dyn SchemaProvider>) -> Self {
        Self {
            persistence,
            configuration: Arc::new(ConfigurationStore::new()),
            schema,
            invalidations: InvalidationBus::new(),
        }
    }

    pub fn views(&self) -> EntityViews<'_> {
        EntityViews::new(&self.configuration, self.schema.as_ref())
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Stored override as served over HTTP. `value` is the raw JSON form.
#[derive(Debug, Serialize)]
pub struct ConfigurationResponse {
    pub key: ConfigurationKey,
    pub entity: Option<String>,
    pub value: serde_json::Value,
    pub last_written_at: Timestamp,
    pub last_written_by: Option<String>,
    pub fingerprint: String,
}

impl From<&OverrideRecord> for ConfigurationResponse {
    fn from(record: &OverrideRecord) -> Self {
        Self {
            key: record.key,
            entity: record.scope.entity_name().map(str::to_string),
            value: record.value.to_json(),
            last_written_at: record.last_written_at,
            last_written_by: record.last_written_by.clone(),
            fingerprint: record.value.fingerprint(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

fn bad_request(e: &ValidationError) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(&e.to_string())))
}

fn config_error(e: ConfigError) -> ApiError {
    match e {
        ConfigError::Validation(v) => bad_request(&v),
        ConfigError::Persistence(source) => {
            log::error!("Configuration write failed: {:#}", source);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("Failed to persist configuration")),
            )
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigurationKey, ApiError> {
    key.parse::<ConfigurationKey>().map_err(|e| bad_request(&e))
}

/// GET /configurations
pub async fn list_configurations<S: ConfigurationPersistence>(
    State(state): State<AppState<S>>,
) -> Json<ListResponse<ConfigurationResponse>> {
    let items: Vec<ConfigurationResponse> = state
        .configuration
        .records()
        .iter()
        .map(ConfigurationResponse::from)
        .collect();
    let total = items.len();
    Json(ListResponse { items, total })
}

/// GET /configurations/{key}
pub async fn get_configuration<S: ConfigurationPersistence>(
    Path(key): Path<String>,
    State(state): State<AppState<S>>,
) -> Result<Response, ApiError> {
    read_configuration(&state, &key, Scope::Global)
}

/// GET /configurations/{key}/{entity}
pub async fn get_entity_configuration<S: ConfigurationPersistence>(
    Path((key, entity)): Path<(String, String)>,
    State(state): State<AppState<S>>,
) -> Result<Response, ApiError> {
    read_configuration(&state, &key, Scope::entity(entity))
}

fn read_configuration<S>(state: &AppState<S>, key: &str, scope: Scope) -> Result<Response, ApiError> {
    let key = parse_key(key)?;

    let Some(record) = state.configuration.record(key, &scope) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!(
                "Configuration '{}' is not set for {}",
                key, scope
            ))),
        ));
    };

    let response = ConfigurationResponse::from(&record);
    let etag = format!("\"{}\"", response.fingerprint);
    Ok(([(header::ETAG, etag)], Json(response)).into_response())
}

/// PUT /configurations/{key}
pub async fn upsert_configuration<S: ConfigurationPersistence>(
    Path(key): Path<String>,
    State(state): State<AppState<S>>,
    user: UserContext,
    RequestJson(body): RequestJson<serde_json::Value>,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    write_configuration(&state, &key, Scope::Global, user, body).await
}

/// PUT /configurations/{key}/{entity}
pub async fn upsert_entity_configuration<S: ConfigurationPersistence>(
    Path((key, entity)): Path<(String, String)>,
    State(state): State<AppState<S>>,
    user: UserContext,
    RequestJson(body): RequestJson<serde_json::Value>,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    write_configuration(&state, &key, Scope::entity(entity), user, body).await
}

async fn write_configuration<S: ConfigurationPersistence>(
    state: &AppState<S>,
    key: &str,
    scope: Scope,
    user: UserContext,
    body: serde_json::Value,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    let key = parse_key(key)?;
    let value = ConfigurationValue::from_json(key, body).map_err(|e| bad_request(&e))?;

    if let Some(entity) = scope.entity_name() {
        match &value {
            ConfigurationValue::Template(template) => {
                let fields: Vec<String> = state
                    .schema
                    .fields(entity)
                    .into_iter()
                    .map(|field| field.name)
                    .collect();
                let unknown = unknown_placeholders(&template.format, &fields);
                if !unknown.is_empty() {
                    log::warn!(
                        "Reference template for '{}' mentions unknown fields: {}",
                        entity,
                        unknown.join(", ")
                    );
                }
            }
            ConfigurationValue::LabelMap(types) if key == ConfigurationKey::EntityColumnsTypes => {
                check_type_overrides(entity, &state.schema.fields(entity), types)
                    .map_err(|e| bad_request(&e))?;
            }
            _ => {}
        }
    }

    let invalidates = key.embedding_endpoints(&scope);
    let record = ConfigurationMutations::upsert(
        &state.configuration,
        state.persistence.as_ref(),
        &state.invalidations,
        key,
        scope,
        value,
        &invalidates,
        user.author(),
    )
    .await
    .map_err(config_error)?;

    Ok(Json(ConfigurationResponse::from(&record)))
}
