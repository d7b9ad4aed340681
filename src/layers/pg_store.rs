use super::{LayerStore, StoreError, LAYER_TABLE};
use crate::config::HarmonyDbConfig;
use async_trait::async_trait;
use log::debug;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::collections::BTreeSet;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Layer store on the shared HarmonyDB (Yugabyte/Postgres) cluster.
#[derive(Clone)]
pub struct PgLayerStore {
    pool: PgPool,
}

fn map_sqlx(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StoreError::Unreachable(error.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

impl PgLayerStore {
    /// Connect using the `[HarmonyDB]` settings of a node config.
    ///
    /// Hosts are tried in order; the first one that accepts a connection is
    /// used. The layer table is created with a unique title constraint if it
    /// does not exist yet.
    pub async fn connect(settings: &HarmonyDbConfig) -> Result<Self, StoreError> {
        let port = settings
            .port_number()
            .map_err(|e| StoreError::Unreachable(format!("invalid port {:?}: {}", settings.port, e)))?;

        let hosts: Vec<&str> = if settings.hosts.is_empty() {
            vec![settings.primary_host()]
        } else {
            settings.hosts.iter().map(String::as_str).collect()
        };

        let mut last_error = None;
        for host in hosts {
            let options = PgConnectOptions::new()
                .host(host)
                .port(port)
                .username(&settings.username)
                .password(&settings.password)
                .database(&settings.database);
            match PgPoolOptions::new()
                .max_connections(1)
                .acquire_timeout(CONNECT_TIMEOUT)
                .connect_with(options)
                .await
            {
                Ok(pool) => {
                    debug!("Connected to HarmonyDB at {}:{}", host, port);
                    let store = Self { pool };
                    store.ensure_table().await?;
                    return Ok(store);
                }
                Err(e) => {
                    debug!("HarmonyDB host {} rejected connection: {}", host, e);
                    last_error = Some(format!("{}:{}: {}", host, port, e));
                }
            }
        }
        Err(StoreError::Unreachable(
            last_error.unwrap_or_else(|| "no database hosts configured".to_string()),
        ))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_table(&self) -> Result<(), StoreError> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {LAYER_TABLE} (\
             id SERIAL PRIMARY KEY, \
             title VARCHAR(300) UNIQUE NOT NULL, \
             config TEXT NOT NULL)"
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}

#[async_trait]
impl LayerStore for PgLayerStore {
    async fn list_non_empty_titles(&self) -> Result<BTreeSet<String>, StoreError> {
        let sql = format!("SELECT title FROM {LAYER_TABLE} WHERE LENGTH(config) > 0");
        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(|(title,)| title).collect())
    }

    async fn insert_layer(&self, title: &str, config: &str) -> Result<(), StoreError> {
        let sql = format!("INSERT INTO {LAYER_TABLE} (title, config) VALUES ($1, $2)");
        let result = sqlx::query(&sql)
            .bind(title)
            .bind(config)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::Integrity {
                    title: title.to_string(),
                })
            }
            Err(e) => Err(map_sqlx(e)),
        }
    }

    async fn replace_layer(&self, title: &str, config: &str) -> Result<bool, StoreError> {
        let sql = format!("UPDATE {LAYER_TABLE} SET config = $2 WHERE title = $1");
        let done = sqlx::query(&sql)
            .bind(title)
            .bind(config)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(done.rows_affected() > 0)
    }

    async fn get_layer(&self, title: &str) -> Result<Option<String>, StoreError> {
        let sql = format!("SELECT config FROM {LAYER_TABLE} WHERE title = $1");
        let row: Option<(String,)> = sqlx::query_as(&sql)
            .bind(title)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(|(config,)| config))
    }
}
