//! SQLite formatter
//!
//! SQLite only accepts `AUTOINCREMENT` directly after `PRIMARY KEY` and can add
//! or drop a single column per `ALTER TABLE`; requests for several columns at
//! once are rejected rather than split into multiple statements.

use async_trait::async_trait;

use crate::backends::{ConnectionSettings, DatabaseValue, SqlDialect};
use crate::config::MigratorConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::migrations::schema_builder::Column;

use super::{
    require_column_names, require_columns, require_table_name, MigrationFormatter, Statement,
};

#[derive(Debug, Clone)]
pub struct SqliteFormatter {
    connection: ConnectionSettings,
    config: MigratorConfig,
}

impl SqliteFormatter {
    /// Create a formatter with the default configuration
    pub fn new(database_url: &str) -> MigrationResult<Self> {
        Self::with_config(database_url, MigratorConfig::default())
    }

    pub fn with_config(database_url: &str, config: MigratorConfig) -> MigrationResult<Self> {
        config.validate()?;
        Ok(Self {
            connection: ConnectionSettings::parse(database_url)?,
            config,
        })
    }
}

#[async_trait]
impl MigrationFormatter for SqliteFormatter {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::SQLite
    }

    fn config(&self) -> &MigratorConfig {
        &self.config
    }

    fn connection(&self) -> &ConnectionSettings {
        &self.connection
    }

    fn column_definition(&self, column: &Column) -> String {
        let mut definition = format!("{} {}", column.name, column.column_type);
        if column.primary_key {
            definition.push_str(" primary key");
        }
        if column.auto_increment {
            definition.push(' ');
            definition.push_str(self.dialect().auto_increment());
        }
        if column.not_null {
            definition.push_str(" not null");
        }
        definition
    }

    fn add_columns(&self, table_name: &str, columns: &[Column]) -> MigrationResult<Statement> {
        require_table_name(table_name)?;
        require_columns(table_name, columns)?;
        if columns.len() > 1 {
            return Err(MigrationError::unsupported(format!(
                "SQLite cannot add {} columns to '{}' in one statement",
                columns.len(),
                table_name
            )));
        }

        let column = &columns[0];
        Ok(Statement::new(format!(
            "ALTER TABLE {} ADD {} {}",
            table_name, column.name, column.column_type
        )))
    }

    fn drop_columns(
        &self,
        table_name: &str,
        column_names: &[String],
    ) -> MigrationResult<Statement> {
        require_table_name(table_name)?;
        require_column_names(table_name, column_names)?;
        if column_names.len() > 1 {
            return Err(MigrationError::unsupported(format!(
                "SQLite cannot drop {} columns from '{}' in one statement",
                column_names.len(),
                table_name
            )));
        }

        Ok(Statement::new(format!(
            "ALTER TABLE {} DROP COLUMN {};",
            table_name, column_names[0]
        )))
    }

    fn check_schema_exists(&self) -> MigrationResult<Statement> {
        let mut writer = self.value_writer();
        let table = writer.push(&DatabaseValue::from(self.migrations_table()));
        Ok(writer.finish(format!(
            "select 1 from sqlite_master where type = 'table' and name = {}",
            table
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> SqliteFormatter {
        SqliteFormatter::new("sqlite::memory:").unwrap()
    }

    #[test]
    fn test_create_schema_orders_autoincrement() {
        assert_eq!(
            formatter().create_schema().unwrap().sql,
            "CREATE TABLE schema_migrations(\nid integer primary key autoincrement not null, version varchar(255)\n);"
        );
    }

    #[test]
    fn test_single_column_alter() {
        let formatter = formatter();
        assert_eq!(
            formatter.add_columns("users", &[Column::new("username")]).unwrap().sql,
            "ALTER TABLE users ADD username varchar(255)"
        );
        assert_eq!(
            formatter.drop_columns("users", &["username".to_string()]).unwrap().sql,
            "ALTER TABLE users DROP COLUMN username;"
        );
    }

    #[test]
    fn test_multi_column_alter_unsupported() {
        let formatter = formatter();
        let add = formatter.add_columns("users", &[Column::new("a"), Column::new("b")]);
        assert!(matches!(add, Err(MigrationError::Unsupported(_))));

        let drop = formatter.drop_columns("users", &["a".to_string(), "b".to_string()]);
        assert!(matches!(drop, Err(MigrationError::Unsupported(_))));
    }

    #[test]
    fn test_check_schema_exists() {
        let statement = formatter().check_schema_exists().unwrap();
        assert_eq!(
            statement.sql,
            "select 1 from sqlite_master where type = 'table' and name = ?"
        );
        assert_eq!(statement.params, vec![DatabaseValue::from("schema_migrations")]);
        assert_eq!(formatter().database(), None);
    }
}
