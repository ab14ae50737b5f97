//! Database Backend Abstractions
//!
//! The pool trait the SQL repository runs statements on, plus the sqlx `Any`
//! implementation used for PostgreSQL, MySQL and SQLite URLs.

pub mod any;
pub mod core;

pub use any::AnyDatabasePool;
pub use self::core::*;
