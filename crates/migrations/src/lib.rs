//! # elif-migrations: Versioned schema migrations for elif.rs
//!
//! Migrations describe schema and data changes as table operations recorded
//! on a [`Schema`]; a dialect [`MigrationFormatter`] turns those operations
//! into SQL and a [`MigrationRepository`] executes them and keeps the
//! bookkeeping table of applied versions. The [`Migrator`] applies pending
//! migrations in list order and rolls back the latest one.
//!
//! ```no_run
//! use elif_migrations::{
//!     Column, Migration, MigrationResult, Migrator, PostgresFormatter, Schema, Table,
//! };
//!
//! struct CreateUsers;
//!
//! impl Migration for CreateUsers {
//!     fn version(&self) -> &str {
//!         "F3A1B2C4-5D6E-4F70-8192-A3B4C5D6E7F8"
//!     }
//!
//!     fn migrate(&self, schema: &mut Schema) -> MigrationResult<()> {
//!         schema.create_table(
//!             Table::new("users")
//!                 .column(Column::typed("id", "integer").primary_key().auto_increment())
//!                 .column(Column::new("name")),
//!         );
//!         Ok(())
//!     }
//!
//!     fn rollback(&self, schema: &mut Schema) -> MigrationResult<()> {
//!         schema.drop_table("users");
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> MigrationResult<()> {
//! let formatter = PostgresFormatter::new("postgres://localhost/app")?;
//! let migrator = Migrator::new(vec![Box::new(CreateUsers)], formatter);
//! let result = migrator.migrate().await;
//! assert!(result.is_success());
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod error;
pub mod formatter;
pub mod migrations;
pub mod repository;

// Re-export core traits and types
pub use backends::{
    AnyDatabasePool, ConnectionSettings, DatabasePool, DatabasePoolConfig, DatabaseRow,
    DatabaseValue, SqlDialect,
};
pub use config::MigratorConfig;
pub use error::{MigrationError, MigrationResult};
pub use formatter::{
    GenericFormatter, MigrationFormatter, MySqlFormatter, PostgresFormatter, SqliteFormatter,
    Statement, ValueMode,
};
pub use migrations::*;
pub use repository::{MigrationRepository, RecordingRepository, SqlMigrationRepository};
