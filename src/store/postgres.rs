use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};

use crate::model::{ConfigurationKey, ConfigurationValue, OverrideRecord, Scope, Timestamp};
use crate::store::traits::ConfigurationPersistence;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS app_configurations (
        key TEXT NOT NULL,
        entity TEXT NOT NULL DEFAULT '',
        value JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_by TEXT,
        PRIMARY KEY (key, entity)
    )
"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the configuration table if it does not exist yet
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .context("Failed to create app_configurations table")?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// One `app_configurations` row before its key and value are decoded
#[derive(Debug, Clone)]
struct StoredRow {
    key: String,
    entity: String,
    value: serde_json::Value,
    updated_at: Timestamp,
    updated_by: Option<String>,
}

impl StoredRow {
    fn from_row(row: &PgRow) -> Result<Self> {
        Ok(Self {
            key: row.try_get("key")?,
            entity: row.try_get("entity")?,
            value: row.try_get("value")?,
            updated_at: row.try_get("updated_at")?,
            updated_by: row.try_get("updated_by")?,
        })
    }

    fn into_record(self) -> Result<OverrideRecord> {
        let key: ConfigurationKey = self.key.parse()?;
        Ok(OverrideRecord {
            key,
            scope: Scope::from(self.entity),
            value: ConfigurationValue::from_json(key, self.value)?,
            last_written_at: self.updated_at,
            last_written_by: self.updated_by,
        })
    }
}

/// Decode listed rows, skipping unknown keys and values that no longer decode.
/// Skipped rows are left in the table.
fn decode_rows(rows: impl IntoIterator<Item = StoredRow>) -> Vec<OverrideRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let key_name = row.key.clone();
            match row.into_record() {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Ignoring stored configuration '{}': {:#}", key_name, e);
                    None
                }
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl ConfigurationPersistence for PostgresStore {
    async fn read(&self, key: ConfigurationKey, scope: &Scope) -> Result<Option<OverrideRecord>> {
        let row = sqlx::query(
            "SELECT key, entity, value, updated_at, updated_by FROM app_configurations WHERE key = $1 AND entity = $2",
        )
        .bind(key.as_str())
        .bind(scope.storage_key())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch configuration")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let record = StoredRow::from_row(&row)
            .and_then(StoredRow::into_record)
            .with_context(|| format!("Stored configuration '{}' is unreadable", key))?;
        Ok(Some(record))
    }

    async fn write(&self, record: OverrideRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO app_configurations (key, entity, value, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (key, entity) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(record.key.as_str())
        .bind(record.scope.storage_key())
        .bind(record.value.to_json())
        .bind(record.last_written_at)
        .bind(record.last_written_by.as_deref())
        .execute(&self.pool)
        .await
        .context("Failed to upsert configuration")?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<OverrideRecord>> {
        let rows = sqlx::query(
            "SELECT key, entity, value, updated_at, updated_by FROM app_configurations ORDER BY key, entity",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list configurations")?;

        let rows = rows
            .iter()
            .map(StoredRow::from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(decode_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(key: &str, entity: &str, value: serde_json::Value) -> StoredRow {
        StoredRow {
            key: key.to_string(),
            entity: entity.to_string(),
            value,
            updated_at: crate::model::now(),
            updated_by: Some("admin".to_string()),
        }
    }

    #[test]
    fn test_row_decodes_into_record() {
        let record = row("entity_columns_labels", "users", json!({"name": "Full Name"}))
            .into_record()
            .unwrap();

        assert_eq!(record.key, ConfigurationKey::EntityColumnsLabels);
        assert_eq!(record.scope, Scope::entity("users"));
        assert_eq!(
            record.value,
            ConfigurationValue::label_map([("name", "Full Name")])
        );
        assert_eq!(record.last_written_by.as_deref(), Some("admin"));

        let global = row("entities_order", "", json!(["posts"])).into_record().unwrap();
        assert_eq!(global.scope, Scope::Global);
    }

    #[test]
    fn test_listing_skips_unknown_keys_and_bad_values() {
        let records = decode_rows(vec![
            row("entities_order", "", json!(["users", "posts"])),
            row("entity_colors", "users", json!({"name": "red"})),
            row("hidden_entity_relations", "users", json!({"not": "a set"})),
            row("hidden_entity_relations", "posts", json!(["tags"])),
        ]);

        let addresses: Vec<_> = records.iter().map(OverrideRecord::address).collect();
        assert_eq!(
            addresses,
            vec![
                (ConfigurationKey::EntitiesOrder, Scope::Global),
                (ConfigurationKey::HiddenEntityRelations, Scope::entity("posts")),
            ]
        );
    }
}
