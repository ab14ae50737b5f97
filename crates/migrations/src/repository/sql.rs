//! Database-backed repository
//!
//! Formats every operation through its formatter and executes the statement
//! on a pool. The pool is opened lazily through
//! [`MigrationFormatter::create_connection`] the first time it is needed, unless
//! one was supplied up front.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::MigrationRepository;
use crate::backends::{DatabasePool, DatabaseValue};
use crate::error::{MigrationError, MigrationResult};
use crate::formatter::{MigrationFormatter, Statement};
use crate::migrations::definitions::Migration;
use crate::migrations::schema_builder::{Column, Table};

/// Repository executing formatted statements against a live database
pub struct SqlMigrationRepository {
    formatter: Box<dyn MigrationFormatter>,
    pool: OnceCell<Arc<dyn DatabasePool>>,
}

impl SqlMigrationRepository {
    /// Create a repository that connects on first use
    pub fn new<F: MigrationFormatter + 'static>(formatter: F) -> Self {
        Self::from_boxed(Box::new(formatter))
    }

    pub fn from_boxed(formatter: Box<dyn MigrationFormatter>) -> Self {
        Self {
            formatter,
            pool: OnceCell::new(),
        }
    }

    /// Create a repository on an already open pool
    pub fn with_pool<F: MigrationFormatter + 'static>(
        formatter: F,
        pool: Arc<dyn DatabasePool>,
    ) -> Self {
        Self {
            formatter: Box::new(formatter),
            pool: OnceCell::new_with(Some(pool)),
        }
    }

    /// Get the formatter statements are generated with
    pub fn formatter(&self) -> &dyn MigrationFormatter {
        self.formatter.as_ref()
    }

    /// Close the pool, if one was opened
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }

    async fn pool(&self) -> MigrationResult<&Arc<dyn DatabasePool>> {
        self.pool
            .get_or_try_init(|| self.formatter.create_connection())
            .await
    }

    async fn execute(&self, statement: MigrationResult<Statement>) -> MigrationResult<()> {
        let statement = statement?;
        tracing::debug!("Executing: {}", statement.sql);
        self.pool()
            .await?
            .execute(&statement.sql, &statement.params)
            .await?;
        Ok(())
    }

    async fn fetch_version(
        &self,
        statement: MigrationResult<Statement>,
    ) -> MigrationResult<Option<String>> {
        let statement = statement?;
        let row = self
            .pool()
            .await?
            .fetch_optional(&statement.sql, &statement.params)
            .await?;

        match row {
            Some(row) => match row.get_by_index(0)? {
                DatabaseValue::String(version) => Ok(Some(version.clone())),
                DatabaseValue::Null => Ok(None),
                other => Err(MigrationError::Database(format!(
                    "Unexpected version value: {}",
                    other
                ))),
            },
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MigrationRepository for SqlMigrationRepository {
    async fn schema_exists(&self) -> MigrationResult<bool> {
        let statement = self.formatter.check_schema_exists()?;
        let row = self
            .pool()
            .await?
            .fetch_optional(&statement.sql, &statement.params)
            .await?;
        Ok(row.is_some())
    }

    async fn build_schema(&self) -> MigrationResult<()> {
        self.execute(self.formatter.create_schema()).await?;
        tracing::info!(
            "Created migrations table '{}'",
            self.formatter.migrations_table()
        );
        Ok(())
    }

    async fn version_exists(&self, version: &str) -> MigrationResult<bool> {
        let found = self
            .fetch_version(self.formatter.select_version(version))
            .await?;
        Ok(found.is_some())
    }

    async fn save_migration(&self, migration: &dyn Migration) -> MigrationResult<()> {
        self.execute(self.formatter.save_version(migration.version()))
            .await
    }

    async fn read_latest_version(&self) -> MigrationResult<Option<String>> {
        self.fetch_version(self.formatter.select_latest_version())
            .await
    }

    async fn delete_migration(&self, migration: &dyn Migration) -> MigrationResult<()> {
        self.execute(self.formatter.delete_version(migration.version()))
            .await
    }

    async fn applied_versions(&self) -> MigrationResult<Vec<String>> {
        let statement = self.formatter.select_versions()?;
        let rows = self
            .pool()
            .await?
            .fetch_all(&statement.sql, &statement.params)
            .await?;

        rows.iter()
            .map(|row| match row.get_by_index(0)? {
                DatabaseValue::String(version) => Ok(version.clone()),
                other => Err(MigrationError::Database(format!(
                    "Unexpected version value: {}",
                    other
                ))),
            })
            .collect()
    }

    async fn create_table(&self, table: &Table) -> MigrationResult<()> {
        self.execute(self.formatter.create_table(table)).await
    }

    async fn drop_table(&self, table_name: &str) -> MigrationResult<()> {
        self.execute(self.formatter.drop_table(table_name)).await
    }

    async fn add_columns(&self, table_name: &str, columns: &[Column]) -> MigrationResult<()> {
        self.execute(self.formatter.add_columns(table_name, columns))
            .await
    }

    async fn remove_columns(
        &self,
        table_name: &str,
        column_names: &[String],
    ) -> MigrationResult<()> {
        self.execute(self.formatter.drop_columns(table_name, column_names))
            .await
    }

    async fn insert(
        &self,
        table_name: &str,
        values: &[(String, DatabaseValue)],
    ) -> MigrationResult<()> {
        self.execute(self.formatter.insert(table_name, values)).await
    }

    async fn delete(
        &self,
        table_name: &str,
        conditions: &[(String, DatabaseValue)],
    ) -> MigrationResult<()> {
        self.execute(self.formatter.delete(table_name, conditions))
            .await
    }

    async fn update(
        &self,
        table_name: &str,
        values: &[(String, DatabaseValue)],
        conditions: &[(String, DatabaseValue)],
    ) -> MigrationResult<()> {
        self.execute(self.formatter.update(table_name, values, conditions))
            .await
    }
}
