//! MySQL formatter

use async_trait::async_trait;

use crate::backends::{ConnectionSettings, DatabaseValue, SqlDialect};
use crate::config::MigratorConfig;
use crate::error::MigrationResult;
use crate::migrations::schema_builder::Column;

use super::{
    require_column_names, require_columns, require_table_name, MigrationFormatter, Statement,
};

#[derive(Debug, Clone)]
pub struct MySqlFormatter {
    connection: ConnectionSettings,
    config: MigratorConfig,
}

impl MySqlFormatter {
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
impl MigrationFormatter for MySqlFormatter {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::MySQL
    }

    fn config(&self) -> &MigratorConfig {
        &self.config
    }

    fn connection(&self) -> &ConnectionSettings {
        &self.connection
    }

    fn add_columns(&self, table_name: &str, columns: &[Column]) -> MigrationResult<Statement> {
        require_table_name(table_name)?;
        require_columns(table_name, columns)?;

        let columns: Vec<String> = columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.column_type))
            .collect();

        // MySQL takes a parenthesized list for several columns
        let sql = if columns.len() == 1 {
            format!("ALTER TABLE {} ADD {}", table_name, columns[0])
        } else {
            format!("ALTER TABLE {} ADD ({})", table_name, columns.join(", "))
        };
        Ok(Statement::new(sql))
    }

    fn drop_columns(
        &self,
        table_name: &str,
        column_names: &[String],
    ) -> MigrationResult<Statement> {
        require_table_name(table_name)?;
        require_column_names(table_name, column_names)?;

        let clauses: Vec<String> = column_names
            .iter()
            .map(|name| format!("DROP COLUMN {}", name))
            .collect();

        Ok(Statement::new(format!(
            "ALTER TABLE {} {};",
            table_name,
            clauses.join(", ")
        )))
    }

    fn check_schema_exists(&self) -> MigrationResult<Statement> {
        let mut writer = self.value_writer();
        let schema = match self.database() {
            Some(database) => writer.push(&DatabaseValue::from(database)),
            None => "database()".to_string(),
        };
        let table = writer.push(&DatabaseValue::from(self.migrations_table()));

        Ok(writer.finish(format!(
            "select 1 from information_schema.tables where table_schema = {} and table_name = {}",
            schema, table
        )))
    }
}
