//! Migration Rollback - Reverts the most recently applied migration
//!
//! Only the latest recorded version is ever rolled back. A missing bookkeeping
//! table, an empty history or a version the migrator does not know are all
//! no-ops.

use std::time::Instant;

use super::definitions::{Migration, MigrationDirection, RollbackResult};
use super::runner::Migrator;
use super::schema_builder::Schema;
use crate::error::MigrationResult;

impl Migrator {
    /// Roll back the latest applied migration
    ///
    /// Never returns an error; a failure is logged and reported in the result.
    pub async fn rollback(&self) -> RollbackResult {
        let start_time = Instant::now();
        let mut result = RollbackResult::default();

        match self.latest_version().await {
            Ok(Some(version)) => {
                result.target_version = Some(version.clone());
                match self.find_migration(&version) {
                    Some(migration) => match self.revert(migration).await {
                        Ok(()) => {
                            result.rolled_back = true;
                            tracing::info!(
                                "Rolled back migration: {} - {}",
                                migration.version(),
                                migration.name()
                            );
                        }
                        Err(error) => {
                            tracing::error!("Rollback of migration {} failed: {}", version, error);
                            result.error = Some(error);
                        }
                    },
                    None => {
                        tracing::warn!(
                            "Latest version {} matches no known migration, nothing to roll back",
                            version
                        );
                    }
                }
            }
            Ok(None) => tracing::warn!("No applied migrations to roll back"),
            Err(error) => {
                tracing::error!("Failed to read latest migration version: {}", error);
                result.error = Some(error);
            }
        }

        result.execution_time_ms = start_time.elapsed().as_millis();
        result
    }

    async fn latest_version(&self) -> MigrationResult<Option<String>> {
        if !self.repository().schema_exists().await? {
            return Ok(None);
        }
        self.repository().read_latest_version().await
    }

    fn find_migration(&self, version: &str) -> Option<&dyn Migration> {
        self.migrations()
            .iter()
            .find(|m| m.version() == version)
            .map(|m| m.as_ref())
    }

    async fn revert(&self, migration: &dyn Migration) -> MigrationResult<()> {
        let mut schema = Schema::new();
        migration.rollback(&mut schema)?;
        self.replay(migration, schema, MigrationDirection::Down).await?;
        self.repository().delete_migration(migration).await
    }
}
