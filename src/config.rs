use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub connection_string: Option<String>,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

/// Where the introspected schema document lives. Without a path the
/// service starts with no entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            max_connections: Some(20),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config` file and
    /// `ENTCFG_` environment variables, in increasing precedence.
    ///
    /// Nested keys use a double underscore, e.g. `ENTCFG_SERVER__PORT`.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("ENTCFG")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Get the database URL from config or environment
    pub fn database_url(&self) -> anyhow::Result<String> {
        if let Some(connection_string) = &self.database.connection_string {
            return Ok(connection_string.clone());
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            return Ok(url);
        }

        anyhow::bail!("storage backend is postgres but no database connection string is configured")
    }

    pub fn max_connections(&self) -> u32 {
        self.database.max_connections.unwrap_or(20)
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
