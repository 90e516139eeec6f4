use entity_config_rust::config::AppConfig;
use entity_config_rust::run_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("sqlx", log::LevelFilter::Warn)
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}:{} storage={:?}",
        config.server.host,
        config.server.port,
        config.storage.backend
    );

    run_server(config).await
}
