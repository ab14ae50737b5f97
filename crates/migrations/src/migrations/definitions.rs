//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the [`Migration`] trait implemented by every schema change, the
//! progress event the migrator re-emits, and the result types returned by a
//! run or a rollback.

use crate::error::{MigrationError, MigrationResult};
use super::schema_builder::Schema;

/// A single versioned, reversible schema or data change
///
/// Implementations describe their work by recording operations on the given
/// [`Schema`]; they never hold a connection. The version is the only key used
/// to decide whether a migration has been applied, so it must be unique and
/// must never change once released. Opaque tokens such as UUIDs avoid
/// collisions between branches (see [`generate_version`]).
pub trait Migration: Send + Sync {
    /// Stable, globally unique identifier
    fn version(&self) -> &str;

    /// Human-readable name used in logs
    fn name(&self) -> &str {
        self.version()
    }

    /// Record the operations that apply this change
    fn migrate(&self, schema: &mut Schema) -> MigrationResult<()>;

    /// Record the operations that revert this change
    fn rollback(&self, schema: &mut Schema) -> MigrationResult<()>;
}

/// Generate a fresh version token for a new migration
pub fn generate_version() -> String {
    uuid::Uuid::new_v4().to_string().to_uppercase()
}

/// Progress message emitted while a migration runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationEvent {
    /// Version of the migration that produced the message
    pub version: String,
    pub message: String,
}

/// Migration direction for execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDirection {
    /// Apply the migration
    Up,
    /// Rollback the migration
    Down,
}

/// A migration that failed, with the error that stopped it
#[derive(Debug, Clone)]
pub struct MigrationFailure {
    pub version: String,
    pub error: MigrationError,
}

/// Result of running migrations
#[derive(Debug, Default)]
pub struct MigrationRunResult {
    /// Number of migrations that were applied
    pub applied_count: usize,
    /// Versions of migrations that were applied, in order
    pub applied_migrations: Vec<String>,
    /// Number of migrations that were skipped (already applied)
    pub skipped_count: usize,
    /// Migrations that failed; the run continued past each of them
    pub failed_migrations: Vec<MigrationFailure>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl MigrationRunResult {
    /// Whether every migration was applied or skipped
    pub fn is_success(&self) -> bool {
        self.failed_migrations.is_empty()
    }
}

/// Result of rolling back the latest migration
#[derive(Debug, Default)]
pub struct RollbackResult {
    /// Latest applied version when the rollback started, if any
    pub target_version: Option<String>,
    /// Whether the target was reverted and its record removed
    pub rolled_back: bool,
    /// Error that stopped the rollback
    pub error: Option<MigrationError>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl RollbackResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Migration status in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Migration is pending (not yet applied)
    Pending,
    /// Migration has been applied
    Applied,
}

/// Status of one known migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationState {
    pub version: String,
    pub name: String,
    pub status: MigrationStatus,
}
