//! Migration Repository
//!
//! Persists which versions have been applied and carries out table operations
//! on behalf of the migrator. [`SqlMigrationRepository`] executes formatted
//! statements on a live database; [`RecordingRepository`] keeps everything in
//! memory and records the statements it would have run.

pub mod recording;
pub mod sql;

use async_trait::async_trait;

use crate::backends::DatabaseValue;
use crate::error::MigrationResult;
use crate::migrations::definitions::Migration;
use crate::migrations::schema_builder::{Column, Table};

pub use recording::RecordingRepository;
pub use sql::SqlMigrationRepository;

/// Storage and execution boundary used by the migrator
#[async_trait]
pub trait MigrationRepository: Send + Sync {
    /// Whether the bookkeeping table exists
    async fn schema_exists(&self) -> MigrationResult<bool>;

    /// Create the bookkeeping table
    async fn build_schema(&self) -> MigrationResult<()>;

    /// Whether `version` is recorded as applied
    async fn version_exists(&self, version: &str) -> MigrationResult<bool>;

    /// Record a successfully applied migration
    async fn save_migration(&self, migration: &dyn Migration) -> MigrationResult<()>;

    /// Version of the most recently recorded migration, by insertion order
    async fn read_latest_version(&self) -> MigrationResult<Option<String>>;

    /// Remove the record of a rolled back migration
    async fn delete_migration(&self, migration: &dyn Migration) -> MigrationResult<()>;

    /// Every recorded version, oldest first
    async fn applied_versions(&self) -> MigrationResult<Vec<String>>;

    async fn create_table(&self, table: &Table) -> MigrationResult<()>;

    async fn drop_table(&self, table_name: &str) -> MigrationResult<()>;

    async fn add_columns(&self, table_name: &str, columns: &[Column]) -> MigrationResult<()>;

    async fn remove_columns(
        &self,
        table_name: &str,
        column_names: &[String],
    ) -> MigrationResult<()>;

    async fn insert(
        &self,
        table_name: &str,
        values: &[(String, DatabaseValue)],
    ) -> MigrationResult<()>;

    async fn delete(
        &self,
        table_name: &str,
        conditions: &[(String, DatabaseValue)],
    ) -> MigrationResult<()>;

    async fn update(
        &self,
        table_name: &str,
        values: &[(String, DatabaseValue)],
        conditions: &[(String, DatabaseValue)],
    ) -> MigrationResult<()>;
}
