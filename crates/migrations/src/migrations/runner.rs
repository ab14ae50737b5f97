//! Migration Runner - Applies migrations through a repository
//!
//! The [`Migrator`] walks its migrations in list order, creating the
//! bookkeeping table on demand, and applies every migration whose version is
//! not yet recorded. Each migration records its operations on a fresh
//! [`Schema`] which is replayed against the repository and then dropped.
//! Failures are contained per migration: they are logged, reported in the
//! [`MigrationRunResult`] and the run moves on to the next migration.

use std::collections::HashSet;
use std::time::Instant;

use super::definitions::{
    Migration, MigrationDirection, MigrationEvent, MigrationFailure, MigrationRunResult,
    MigrationState, MigrationStatus,
};
use super::registry::MigrationRegistry;
use super::schema_builder::{Operation, Schema};
use crate::error::MigrationResult;
use crate::formatter::MigrationFormatter;
use crate::repository::{MigrationRepository, SqlMigrationRepository};

type MigrationListener = Box<dyn Fn(&MigrationEvent) + Send + Sync>;

/// Runs an ordered list of migrations against one database
pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
    repository: Box<dyn MigrationRepository>,
    listeners: Vec<MigrationListener>,
}

impl Migrator {
    /// Create a migrator executing through `formatter`'s database
    pub fn new<F: MigrationFormatter + 'static>(
        migrations: Vec<Box<dyn Migration>>,
        formatter: F,
    ) -> Self {
        Self::with_repository(migrations, SqlMigrationRepository::new(formatter))
    }

    /// Create a migrator on any repository
    pub fn with_repository<R: MigrationRepository + 'static>(
        migrations: Vec<Box<dyn Migration>>,
        repository: R,
    ) -> Self {
        Self {
            migrations,
            repository: Box::new(repository),
            listeners: Vec::new(),
        }
    }

    /// Create a migrator from registered migrations, rejecting duplicate versions
    pub fn from_registry<R: MigrationRepository + 'static>(
        registry: &MigrationRegistry,
        repository: R,
    ) -> MigrationResult<Self> {
        registry.validate()?;
        Ok(Self::with_repository(registry.instantiate(), repository))
    }

    /// Register a listener for progress messages
    pub fn on_migrating<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&MigrationEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn migrations(&self) -> &[Box<dyn Migration>] {
        &self.migrations
    }

    pub fn repository(&self) -> &dyn MigrationRepository {
        self.repository.as_ref()
    }

    /// Apply every pending migration
    ///
    /// Never returns an error; failed migrations are listed in the result and
    /// the remaining migrations still run.
    pub async fn migrate(&self) -> MigrationRunResult {
        let start_time = Instant::now();
        let mut result = MigrationRunResult::default();

        for migration in &self.migrations {
            match self.apply(migration.as_ref()).await {
                Ok(true) => {
                    result.applied_count += 1;
                    result.applied_migrations.push(migration.version().to_string());
                }
                Ok(false) => result.skipped_count += 1,
                Err(error) => {
                    tracing::error!(
                        "Migration {} - {} failed: {}",
                        migration.version(),
                        migration.name(),
                        error
                    );
                    result.failed_migrations.push(MigrationFailure {
                        version: migration.version().to_string(),
                        error,
                    });
                }
            }
        }

        result.execution_time_ms = start_time.elapsed().as_millis();
        tracing::info!(
            "Migration run finished: {} applied, {} skipped, {} failed in {}ms",
            result.applied_count,
            result.skipped_count,
            result.failed_migrations.len(),
            result.execution_time_ms
        );
        result
    }

    /// Report which known migrations have been applied
    pub async fn status(&self) -> MigrationResult<Vec<MigrationState>> {
        let applied: HashSet<String> = if self.repository.schema_exists().await? {
            self.repository.applied_versions().await?.into_iter().collect()
        } else {
            HashSet::new()
        };

        Ok(self
            .migrations
            .iter()
            .map(|migration| MigrationState {
                version: migration.version().to_string(),
                name: migration.name().to_string(),
                status: if applied.contains(migration.version()) {
                    MigrationStatus::Applied
                } else {
                    MigrationStatus::Pending
                },
            })
            .collect())
    }

    /// Apply one migration; `Ok(false)` when it was already recorded
    async fn apply(&self, migration: &dyn Migration) -> MigrationResult<bool> {
        self.ensure_schema().await?;

        if self.repository.version_exists(migration.version()).await? {
            tracing::debug!("Skipping migration {}: already applied", migration.version());
            return Ok(false);
        }

        tracing::info!("Applying migration: {} - {}", migration.version(), migration.name());
        let mut schema = Schema::new();
        migration.migrate(&mut schema)?;
        self.replay(migration, schema, MigrationDirection::Up).await?;
        self.repository.save_migration(migration).await?;
        Ok(true)
    }

    async fn ensure_schema(&self) -> MigrationResult<()> {
        if !self.repository.schema_exists().await? {
            self.repository.build_schema().await?;
        }
        Ok(())
    }

    /// Execute recorded operations in order, announcing each to the listeners
    pub(super) async fn replay(
        &self,
        migration: &dyn Migration,
        schema: Schema,
        direction: MigrationDirection,
    ) -> MigrationResult<()> {
        for operation in schema.into_operations() {
            self.emit(migration.version(), operation.to_string());
            tracing::debug!(?direction, "{}: {}", migration.version(), operation);

            match &operation {
                Operation::Say(_) => {}
                Operation::CreateTable(table) => self.repository.create_table(table).await?,
                Operation::DropTable(table) => self.repository.drop_table(table).await?,
                Operation::AddColumns { table, columns } => {
                    self.repository.add_columns(table, columns).await?
                }
                Operation::RemoveColumns { table, columns } => {
                    self.repository.remove_columns(table, columns).await?
                }
                Operation::Insert { table, values } => self.repository.insert(table, values).await?,
                Operation::Delete { table, conditions } => {
                    self.repository.delete(table, conditions).await?
                }
                Operation::Update {
                    table,
                    values,
                    conditions,
                } => self.repository.update(table, values, conditions).await?,
            }
        }
        Ok(())
    }

    fn emit(&self, version: &str, message: String) {
        let event = MigrationEvent {
            version: version.to_string(),
            message,
        };
        for listener in &self.listeners {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let versions: Vec<&str> = self.migrations.iter().map(|m| m.version()).collect();
        f.debug_struct("Migrator")
            .field("migrations", &versions)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
