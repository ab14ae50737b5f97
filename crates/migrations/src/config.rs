//! Migrator configuration
//!
//! Settings shared by the formatters and the SQL repository: the name of the
//! bookkeeping table, how values are rendered into statements and how the
//! connection pool is sized.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::backends::DatabasePoolConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::formatter::ValueMode;

/// Default name of the bookkeeping table
pub const DEFAULT_MIGRATIONS_TABLE: &str = "schema_migrations";

/// Configuration for the migration system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigratorConfig {
    /// Table name for tracking applied migrations
    pub migrations_table: String,
    /// How values are placed into generated statements
    pub value_mode: ValueMode,
    /// Pool settings used when a formatter opens a connection
    pub pool: DatabasePoolConfig,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            migrations_table: DEFAULT_MIGRATIONS_TABLE.to_string(),
            value_mode: ValueMode::Bound,
            pool: DatabasePoolConfig::default(),
        }
    }
}

impl MigratorConfig {
    /// Load configuration from environment variables, falling back to defaults
    ///
    /// Recognized variables: `ELIF_MIGRATIONS_TABLE`, `ELIF_MIGRATIONS_VALUE_MODE`
    /// (`bound` or `inline`) and `ELIF_MIGRATIONS_MAX_CONNECTIONS`.
    pub fn from_env() -> MigrationResult<Self> {
        let mut config = Self::default();

        if let Ok(table) = env::var("ELIF_MIGRATIONS_TABLE") {
            config.migrations_table = table;
        }

        if let Ok(mode) = env::var("ELIF_MIGRATIONS_VALUE_MODE") {
            config.value_mode = mode.parse()?;
        }

        if let Ok(max) = env::var("ELIF_MIGRATIONS_MAX_CONNECTIONS") {
            config.pool.max_connections = max.parse().map_err(|_| {
                MigrationError::Configuration(format!(
                    "ELIF_MIGRATIONS_MAX_CONNECTIONS must be a positive integer, got '{}'",
                    max
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> MigrationResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> MigrationResult<()> {
        let table = &self.migrations_table;
        let valid = !table.is_empty()
            && !table.starts_with(|c: char| c.is_ascii_digit())
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(MigrationError::Configuration(format!(
                "migrations_table must be a plain identifier, got '{}'",
                table
            )));
        }

        if self.pool.max_connections == 0 {
            return Err(MigrationError::Configuration(
                "pool.max_connections must be at least 1".to_string(),
            ));
        }

        if self.pool.min_connections > self.pool.max_connections {
            return Err(MigrationError::Configuration(
                "pool.min_connections cannot exceed pool.max_connections".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = MigratorConfig::default();
        assert_eq!(config.migrations_table, "schema_migrations");
        assert_eq!(config.value_mode, ValueMode::Bound);
        assert_eq!(config.pool.max_connections, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_with_partial_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("migrations.yaml");
        fs::write(&path, "migrations_table: app_versions\nvalue_mode: inline\n").unwrap();

        let config = MigratorConfig::load(&path).unwrap();
        assert_eq!(config.migrations_table, "app_versions");
        assert_eq!(config.value_mode, ValueMode::Inline);
        assert_eq!(config.pool, DatabasePoolConfig::default());
    }

    #[test]
    fn test_rejects_non_identifier_table() {
        let config = MigratorConfig {
            migrations_table: "versions; drop table users".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MigrationError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = MigratorConfig::load(temp_dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(MigrationError::Configuration(_))));
    }

    // Every case lives in one test so no other test sees these variables
    #[test]
    fn test_from_env() {
        const VARS: [&str; 3] = [
            "ELIF_MIGRATIONS_TABLE",
            "ELIF_MIGRATIONS_VALUE_MODE",
            "ELIF_MIGRATIONS_MAX_CONNECTIONS",
        ];
        let clear = || VARS.iter().for_each(|var| env::remove_var(var));

        clear();
        assert_eq!(MigratorConfig::from_env().unwrap(), MigratorConfig::default());

        env::set_var("ELIF_MIGRATIONS_TABLE", "app_versions");
        env::set_var("ELIF_MIGRATIONS_VALUE_MODE", "Inline");
        env::set_var("ELIF_MIGRATIONS_MAX_CONNECTIONS", "4");
        let config = MigratorConfig::from_env().unwrap();
        assert_eq!(config.migrations_table, "app_versions");
        assert_eq!(config.value_mode, ValueMode::Inline);
        assert_eq!(config.pool.max_connections, 4);

        env::set_var("ELIF_MIGRATIONS_VALUE_MODE", "quoted");
        assert!(matches!(
            MigratorConfig::from_env(),
            Err(MigrationError::Configuration(_))
        ));
        env::set_var("ELIF_MIGRATIONS_VALUE_MODE", "bound");

        env::set_var("ELIF_MIGRATIONS_MAX_CONNECTIONS", "many");
        assert!(matches!(
            MigratorConfig::from_env(),
            Err(MigrationError::Configuration(_))
        ));

        env::set_var("ELIF_MIGRATIONS_MAX_CONNECTIONS", "0");
        assert!(matches!(
            MigratorConfig::from_env(),
            Err(MigrationError::Configuration(_))
        ));

        clear();
    }
}
