//! sqlx `Any` Backend Implementation
//!
//! Connects to whichever driver the URL scheme selects (PostgreSQL, MySQL or
//! SQLite) and implements [`DatabasePool`] on top of it. The formatter decides
//! which SQL text is sent; this layer only binds values and decodes rows.

use async_trait::async_trait;
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::{Any, AnyPool, Column, Row};
use std::time::Duration;

use super::core::*;
use crate::error::{MigrationError, MigrationResult};

/// Connection pool backed by the sqlx `Any` driver
#[derive(Debug, Clone)]
pub struct AnyDatabasePool {
    pool: AnyPool,
}

impl AnyDatabasePool {
    /// Wrap an existing sqlx pool
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Open a pool for the given URL
    pub async fn connect(database_url: &str, config: &DatabasePoolConfig) -> MigrationResult<Self> {
        sqlx::any::install_default_drivers();

        tracing::debug!(
            "Creating migration pool: max={}, min={}, timeout={}s",
            config.max_connections,
            config.min_connections,
            config.acquire_timeout_seconds
        );

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(database_url)
            .await
            .map_err(|e| {
                MigrationError::Connection(format!("Failed to connect to database: {}", e))
            })?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl DatabasePool for AnyDatabasePool {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> MigrationResult<u64> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_database_value(query, param);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| MigrationError::Database(format!("Query execution failed: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn fetch_optional(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> MigrationResult<Option<DatabaseRow>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_database_value(query, param);
        }

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MigrationError::Database(format!("Query fetch failed: {}", e)))?;

        row.as_ref().map(decode_row).transpose()
    }

    async fn fetch_all(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> MigrationResult<Vec<DatabaseRow>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_database_value(query, param);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MigrationError::Database(format!("Query fetch failed: {}", e)))?;

        rows.iter().map(decode_row).collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Bind a DatabaseValue to a sqlx query
fn bind_database_value<'q>(
    query: sqlx::query::Query<'q, Any, AnyArguments<'q>>,
    value: &DatabaseValue,
) -> sqlx::query::Query<'q, Any, AnyArguments<'q>> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::Float32(f) => query.bind(*f),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
    }
}

fn decode_row(row: &AnyRow) -> MigrationResult<DatabaseRow> {
    let columns = row
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();
    let values = (0..row.len())
        .map(|index| decode_value(row, index))
        .collect::<MigrationResult<Vec<_>>>()?;
    Ok(DatabaseRow::new(columns, values))
}

/// Convert a column value to DatabaseValue, trying the text type first
fn decode_value(row: &AnyRow, index: usize) -> MigrationResult<DatabaseValue> {
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return Ok(value.into());
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return Ok(value.into());
    }
    if let Ok(value) = row.try_get::<Option<i32>, _>(index) {
        return Ok(value.into());
    }
    if let Ok(value) = row.try_get::<Option<i16>, _>(index) {
        return Ok(value.map(i32::from).into());
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return Ok(value.into());
    }
    if let Ok(value) = row.try_get::<Option<f32>, _>(index) {
        return Ok(value.into());
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return Ok(value.into());
    }

    Err(MigrationError::Database(format!(
        "Unsupported value type in column {}",
        index
    )))
}
