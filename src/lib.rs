pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod store;

pub use api::routes;
pub use logic::{
    merge_list, render, resolve_label, ConfigurationMutations, EntityViews, ListOverrides,
};
pub use model::*;
pub use store::{
    ConfigurationPersistence, ConfigurationStore, InvalidationBus, InvalidationSink, MemoryStore,
    PostgresStore, SchemaProvider, StaticSchema,
};

use std::sync::Arc;

use crate::api::AppState;
use crate::config::{AppConfig, StorageBackend};

/// Build the shared state and hydrate it from persistence
pub async fn build_state<S: ConfigurationPersistence>(
    persistence: Arc<S>,
    schema: Arc<dyn SchemaProvider>,
) -> anyhow::Result<AppState<S>> {
    let state = AppState::new(persistence, schema);
    ConfigurationMutations::hydrate(&state.configuration, state.persistence.as_ref()).await?;
    Ok(state)
}

pub fn load_schema(config: &AppConfig) -> anyhow::Result<Arc<dyn SchemaProvider>> {
    let schema = match &config.schema.path {
        Some(path) => StaticSchema::load(path)?,
        None => {
            log::warn!("No schema document configured; serving an empty schema");
            StaticSchema::default()
        }
    };
    Ok(Arc::new(schema))
}

async fn serve<S: ConfigurationPersistence + 'static>(
    state: AppState<S>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let app = crate::api::routes::create_router().with_state(state);

    let bind_address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log::info!("Configuration service listening on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Load configuration, connect the configured backend and serve until shutdown
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let schema = load_schema(&config)?;

    match config.storage.backend {
        StorageBackend::Memory => {
            log::info!("Using in-memory configuration storage");
            let state = build_state(Arc::new(MemoryStore::new()), schema).await?;
            serve(state, &config).await
        }
        StorageBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let store = PostgresStore::new(&config.database_url()?, config.max_connections()).await?;
            store.migrate().await?;
            let state = build_state(Arc::new(store), schema).await?;
            serve(state, &config).await
        }
    }
}
