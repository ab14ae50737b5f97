//! Migration System
//!
//! Migration definitions, the operation recorder they write to, the registry
//! that lists them and the migrator that applies and rolls them back.

pub mod definitions;
pub mod registry;
pub mod rollback;
pub mod runner;
pub mod schema_builder;

pub use definitions::*;
pub use registry::MigrationRegistry;
pub use runner::Migrator;
pub use schema_builder::{Column, Operation, Schema, Table, DEFAULT_COLUMN_TYPE};
