//! Error types for the migration system
//!
//! Every fallible operation in the crate returns [`MigrationResult`]. The
//! migrator itself never surfaces these to its caller; it logs them and
//! reports them in its run results instead.

use thiserror::Error;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Error types for migration operations
#[derive(Debug, Clone, Error)]
pub enum MigrationError {
    /// Statement execution or row decoding failed
    #[error("Database error: {0}")]
    Database(String),

    /// Could not connect, or the connection string is unusable
    #[error("Connection error: {0}")]
    Connection(String),

    /// A table model cannot be rendered (empty names, duplicate columns, ...)
    #[error("Schema error: {0}")]
    Schema(String),

    /// The active dialect cannot express the requested operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Error raised from inside a migration body
    #[error("Migration error: {0}")]
    Migration(String),

    /// Two migrations share a version
    #[error("Version conflict: {0}")]
    VersionConflict(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MigrationError {
    /// Create a new error raised by a migration body
    pub fn migration<T: ToString>(msg: T) -> Self {
        Self::Migration(msg.to_string())
    }

    /// Create a new schema error
    pub fn schema<T: ToString>(msg: T) -> Self {
        Self::Schema(msg.to_string())
    }

    /// Create a new unsupported operation error
    pub fn unsupported<T: ToString>(msg: T) -> Self {
        Self::Unsupported(msg.to_string())
    }
}

impl From<sqlx::Error> for MigrationError {
    fn from(err: sqlx::Error) -> Self {
        MigrationError::Database(err.to_string())
    }
}

impl From<serde_yaml::Error> for MigrationError {
    fn from(err: serde_yaml::Error) -> Self {
        MigrationError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        MigrationError::Configuration(err.to_string())
    }
}

impl From<url::ParseError> for MigrationError {
    fn from(err: url::ParseError) -> Self {
        MigrationError::Connection(format!("Invalid database URL: {}", err))
    }
}
