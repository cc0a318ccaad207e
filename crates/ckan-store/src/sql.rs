// crates/ckan-store/src/sql.rs
//
// sqlx-backed implementation of `PersistenceGateway`.
//
// Every `execute` call takes one connection from the pool, runs a single
// statement with positional `?` parameters, and hands the connection back
// when the `PoolConnection` guard drops. That happens on success, on a
// statement failure, and never happens at all when acquisition fails.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use ckan_core::traits::PersistenceGateway;
use ckan_core::{ExecuteMode, PersistenceError, Row, RowSet, SqlValue};

/// Connection string used by `SqlGateway::in_memory`.
pub const IN_MEMORY_URL: &str = "sqlite::memory:";

/// SQL gateway over a pooled SQLite database.
#[derive(Debug, Clone)]
pub struct SqlGateway {
    pool: SqlitePool,
}

impl SqlGateway {
    /// Open a pool against `url` (e.g. `sqlite://adapter.db?mode=rwc`).
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, PersistenceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|e| {
                PersistenceError::acquire(format!("Failed to open database at {}: {}", url, e))
            })?;

        tracing::info!("SQL gateway connected to {}", url);
        Ok(Self { pool })
    }

    /// Private in-memory database.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool is
    /// pinned to one connection that is never reaped.
    pub async fn in_memory() -> Result<Self, PersistenceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(IN_MEMORY_URL)
            .await
            .map_err(|e| {
                PersistenceError::acquire(format!("Failed to open in-memory database: {}", e))
            })?;
        Ok(Self { pool })
    }

    /// Close the pool; subsequent calls fail at connection acquisition.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PersistenceGateway for SqlGateway {
    async fn execute(
        &self,
        statement: &str,
        params: &[SqlValue],
        mode: ExecuteMode,
    ) -> Result<RowSet, PersistenceError> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            tracing::error!("Connection could not be established: {}", e);
            PersistenceError::acquire(e.to_string())
        })?;

        let mut query = sqlx::query(statement);
        for param in params {
            query = match param {
                SqlValue::Null => query.bind(None::<String>),
                SqlValue::Integer(v) => query.bind(*v),
                SqlValue::Real(v) => query.bind(*v),
                SqlValue::Text(s) => query.bind(s.as_str()),
                SqlValue::Bool(b) => query.bind(*b),
            };
        }

        match mode {
            ExecuteMode::Read => {
                let rows = query.fetch_all(&mut *conn).await.map_err(|e| {
                    tracing::error!("Query failed: {}", e);
                    PersistenceError::execution(e.to_string())
                })?;

                rows.iter()
                    .map(decode_row)
                    .collect::<Result<RowSet, _>>()
                    .map_err(|e| PersistenceError::execution(format!("Row decode failed: {}", e)))
            }
            ExecuteMode::Write => {
                let result = query.execute(&mut *conn).await.map_err(|e| {
                    tracing::error!("Update failed: {}", e);
                    PersistenceError::execution(e.to_string())
                })?;

                tracing::debug!("No. of rows updated: {}", result.rows_affected());
                Ok(Vec::new())
            }
        }
    }
}

/// Map one SQLite row into a column-name -> value map using each value's
/// runtime storage class.
fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::new();

    for (idx, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let storage = raw.type_info().name().to_ascii_uppercase();
            match storage.as_str() {
                "INTEGER" | "INT" | "BIGINT" | "INT8" => {
                    SqlValue::Integer(row.try_get_unchecked::<i64, _>(idx)?)
                }
                "BOOLEAN" => SqlValue::Bool(row.try_get_unchecked::<bool, _>(idx)?),
                "REAL" | "FLOAT" | "DOUBLE" => {
                    SqlValue::Real(row.try_get_unchecked::<f64, _>(idx)?)
                }
                "BLOB" => {
                    let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
                    SqlValue::Text(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => SqlValue::Text(row.try_get_unchecked::<String, _>(idx)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }

    Ok(out)
}
