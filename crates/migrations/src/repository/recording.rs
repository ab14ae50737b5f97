//! In-memory repository
//!
//! Keeps applied versions and a simulated catalog of tables in memory and
//! records every statement its formatter renders instead of executing it.
//! Useful as a dry run and as a test double for the migrator.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::MigrationRepository;
use crate::backends::DatabaseValue;
use crate::error::{MigrationError, MigrationResult};
use crate::formatter::{MigrationFormatter, Statement};
use crate::migrations::definitions::Migration;
use crate::migrations::schema_builder::{Column, Table};

#[derive(Debug, Default)]
struct RecordingState {
    schema_built: bool,
    versions: Vec<String>,
    statements: Vec<Statement>,
    tables: BTreeMap<String, Vec<String>>,
}

/// Repository that renders statements without a database
///
/// Clones share the same state, so a caller can keep a handle while the
/// migrator owns another.
#[derive(Clone)]
pub struct RecordingRepository {
    formatter: Arc<dyn MigrationFormatter>,
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingRepository {
    pub fn new<F: MigrationFormatter + 'static>(formatter: F) -> Self {
        Self {
            formatter: Arc::new(formatter),
            state: Arc::new(Mutex::new(RecordingState::default())),
        }
    }

    /// Every statement rendered so far, in order
    pub async fn statements(&self) -> Vec<Statement> {
        self.state.lock().await.statements.clone()
    }

    /// Recorded versions, oldest first
    pub async fn versions(&self) -> Vec<String> {
        self.state.lock().await.versions.clone()
    }

    /// Tables currently present in the simulated catalog
    pub async fn tables(&self) -> Vec<String> {
        self.state.lock().await.tables.keys().cloned().collect()
    }

    /// Columns of a simulated table
    pub async fn columns(&self, table_name: &str) -> Option<Vec<String>> {
        self.state.lock().await.tables.get(table_name).cloned()
    }

    /// Forget the recorded statements, keeping versions and tables
    pub async fn clear_statements(&self) {
        self.state.lock().await.statements.clear();
    }

    async fn record(&self, statement: MigrationResult<Statement>) -> MigrationResult<()> {
        let statement = statement?;
        tracing::debug!("Recording: {}", statement.sql);
        self.state.lock().await.statements.push(statement);
        Ok(())
    }
}

#[async_trait]
impl MigrationRepository for RecordingRepository {
    async fn schema_exists(&self) -> MigrationResult<bool> {
        Ok(self.state.lock().await.schema_built)
    }

    async fn build_schema(&self) -> MigrationResult<()> {
        self.record(self.formatter.create_schema()).await?;
        self.state.lock().await.schema_built = true;
        Ok(())
    }

    async fn version_exists(&self, version: &str) -> MigrationResult<bool> {
        let state = self.state.lock().await;
        Ok(state.versions.iter().any(|v| v == version))
    }

    async fn save_migration(&self, migration: &dyn Migration) -> MigrationResult<()> {
        self.record(self.formatter.save_version(migration.version()))
            .await?;
        self.state
            .lock()
            .await
            .versions
            .push(migration.version().to_string());
        Ok(())
    }

    async fn read_latest_version(&self) -> MigrationResult<Option<String>> {
        Ok(self.state.lock().await.versions.last().cloned())
    }

    async fn delete_migration(&self, migration: &dyn Migration) -> MigrationResult<()> {
        self.record(self.formatter.delete_version(migration.version()))
            .await?;
        self.state
            .lock()
            .await
            .versions
            .retain(|v| v != migration.version());
        Ok(())
    }

    async fn applied_versions(&self) -> MigrationResult<Vec<String>> {
        Ok(self.versions().await)
    }

    async fn create_table(&self, table: &Table) -> MigrationResult<()> {
        let statement = self.formatter.create_table(table)?;
        let mut state = self.state.lock().await;
        if state.tables.contains_key(&table.name) {
            return Err(MigrationError::Database(format!(
                "table {} already exists",
                table.name
            )));
        }
        state.tables.insert(table.name.clone(), table.column_names());
        state.statements.push(statement);
        Ok(())
    }

    async fn drop_table(&self, table_name: &str) -> MigrationResult<()> {
        let statement = self.formatter.drop_table(table_name)?;
        let mut state = self.state.lock().await;
        state.tables.remove(table_name);
        state.statements.push(statement);
        Ok(())
    }

    async fn add_columns(&self, table_name: &str, columns: &[Column]) -> MigrationResult<()> {
        let statement = self.formatter.add_columns(table_name, columns)?;
        let mut state = self.state.lock().await;
        if let Some(existing) = state.tables.get_mut(table_name) {
            for column in columns {
                if existing.contains(&column.name) {
                    return Err(MigrationError::Database(format!(
                        "duplicate column name: {}",
                        column.name
                    )));
                }
            }
            existing.extend(columns.iter().map(|c| c.name.clone()));
        }
        state.statements.push(statement);
        Ok(())
    }

    async fn remove_columns(
        &self,
        table_name: &str,
        column_names: &[String],
    ) -> MigrationResult<()> {
        let statement = self.formatter.drop_columns(table_name, column_names)?;
        let mut state = self.state.lock().await;
        if let Some(existing) = state.tables.get_mut(table_name) {
            existing.retain(|name| !column_names.contains(name));
        }
        state.statements.push(statement);
        Ok(())
    }

    async fn insert(
        &self,
        table_name: &str,
        values: &[(String, DatabaseValue)],
    ) -> MigrationResult<()> {
        self.record(self.formatter.insert(table_name, values)).await
    }

    async fn delete(
        &self,
        table_name: &str,
        conditions: &[(String, DatabaseValue)],
    ) -> MigrationResult<()> {
        self.record(self.formatter.delete(table_name, conditions))
            .await
    }

    async fn update(
        &self,
        table_name: &str,
        values: &[(String, DatabaseValue)],
        conditions: &[(String, DatabaseValue)],
    ) -> MigrationResult<()> {
        self.record(self.formatter.update(table_name, values, conditions))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::GenericFormatter;

    fn repository() -> RecordingRepository {
        RecordingRepository::new(GenericFormatter::new("Server=.;Database=shop;").unwrap())
    }

    #[tokio::test]
    async fn test_build_schema_marks_schema_present() {
        let repo = repository();
        assert!(!repo.schema_exists().await.unwrap());

        repo.build_schema().await.unwrap();

        assert!(repo.schema_exists().await.unwrap());
        let statements = repo.statements().await;
        assert_eq!(statements.len(), 1);
        assert!(statements[0].sql.starts_with("CREATE TABLE schema_migrations("));
    }

    #[tokio::test]
    async fn test_simulated_catalog() {
        let repo = repository();
        let users = Table::new("users").column(Column::typed("id", "integer").primary_key());

        repo.create_table(&users).await.unwrap();
        repo.add_columns("users", &[Column::new("username")]).await.unwrap();
        assert_eq!(
            repo.columns("users").await,
            Some(vec!["id".to_string(), "username".to_string()])
        );

        assert!(repo.create_table(&users).await.is_err());
        assert!(repo.add_columns("users", &[Column::new("username")]).await.is_err());

        repo.remove_columns("users", &["username".to_string()]).await.unwrap();
        repo.drop_table("users").await.unwrap();
        assert!(repo.tables().await.is_empty());
    }

    #[tokio::test]
    async fn test_format_errors_are_not_recorded() {
        let repo = repository();
        assert!(repo.insert("users", &[]).await.is_err());
        assert!(repo.statements().await.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let repo = repository();
        let handle = repo.clone();
        repo.drop_table("users").await.unwrap();
        assert_eq!(handle.statements().await.len(), 1);

        handle.clear_statements().await;
        assert!(repo.statements().await.is_empty());
    }
}
