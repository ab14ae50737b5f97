//! SQL Formatters
//!
//! A formatter turns table operations into dialect-specific statements. It
//! performs no execution: every method returns one complete [`Statement`] that
//! a repository can run as-is. Swapping the formatter is the only change
//! needed to target another database; migrations and the migrator never see
//! SQL.
//!
//! Shared rendering lives in the provided methods of [`MigrationFormatter`];
//! dialects override the hooks where their syntax differs.

pub mod generic;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::backends::{AnyDatabasePool, ConnectionSettings, DatabasePool, DatabaseValue, SqlDialect};
use crate::config::MigratorConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::migrations::schema_builder::{validate_columns, Column, Table};

pub use generic::GenericFormatter;
pub use mysql::MySqlFormatter;
pub use postgres::PostgresFormatter;
pub use sqlite::SqliteFormatter;

/// A single executable statement and the values bound to its placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

/// How values end up in generated statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    /// Placeholders in the SQL text, values in [`Statement::params`]
    #[default]
    Bound,
    /// Values quoted into the SQL text (`'admin'`), embedded quotes doubled
    Inline,
}

impl std::str::FromStr for ValueMode {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bound" => Ok(ValueMode::Bound),
            "inline" => Ok(ValueMode::Inline),
            _ => Err(MigrationError::Configuration(format!(
                "value mode must be 'bound' or 'inline', got '{}'",
                s
            ))),
        }
    }
}

/// Renders values for one statement, collecting bound parameters in order
#[derive(Debug)]
pub struct ValueWriter {
    dialect: SqlDialect,
    mode: ValueMode,
    params: Vec<DatabaseValue>,
}

impl ValueWriter {
    pub fn new(dialect: SqlDialect, mode: ValueMode) -> Self {
        Self {
            dialect,
            mode,
            params: Vec::new(),
        }
    }

    /// Render a value, returning the text to splice into the statement
    ///
    /// `Null` is always written as the `NULL` keyword; an untyped null
    /// parameter would not match every column type.
    pub fn push(&mut self, value: &DatabaseValue) -> String {
        match self.mode {
            ValueMode::Inline => value.to_sql_literal(),
            ValueMode::Bound if value.is_null() => "NULL".to_string(),
            ValueMode::Bound => {
                let placeholder = self.dialect.parameter_placeholder(self.params.len());
                self.params.push(value.clone());
                placeholder
            }
        }
    }

    /// Render `name = value` pairs joined by `separator`
    ///
    /// With `predicate` set, null values render as `name is null`.
    pub fn assignments(
        &mut self,
        pairs: &[(String, DatabaseValue)],
        separator: &str,
        predicate: bool,
    ) -> String {
        pairs
            .iter()
            .map(|(name, value)| {
                if predicate && value.is_null() {
                    format!("{} is null", name)
                } else {
                    format!("{} = {}", name, self.push(value))
                }
            })
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.params,
        }
    }
}

/// Dialect-specific SQL generation for migration operations
#[async_trait]
pub trait MigrationFormatter: Send + Sync {
    /// Get the SQL dialect this formatter emits
    fn dialect(&self) -> SqlDialect;

    /// Get the configuration this formatter was built with
    fn config(&self) -> &MigratorConfig;

    /// Get the parsed connection string
    fn connection(&self) -> &ConnectionSettings;

    /// The active database name, captured from the connection string
    fn database(&self) -> Option<&str> {
        self.connection().database()
    }

    /// Name of the bookkeeping table
    fn migrations_table(&self) -> &str {
        &self.config().migrations_table
    }

    /// Start rendering values for a new statement
    fn value_writer(&self) -> ValueWriter {
        ValueWriter::new(self.dialect(), self.config().value_mode)
    }

    /// Open a live connection pool for this formatter's connection string
    async fn create_connection(&self) -> MigrationResult<Arc<dyn DatabasePool>> {
        let pool = AnyDatabasePool::connect(self.connection().url(), &self.config().pool).await?;
        Ok(Arc::new(pool))
    }

    /// Render one column of a `CREATE TABLE` statement
    fn column_definition(&self, column: &Column) -> String {
        let mut definition = format!("{} {}", column.name, column.column_type);
        if column.primary_key {
            definition.push_str(" primary key");
        }
        if column.not_null {
            definition.push_str(" not null");
        }
        if column.auto_increment {
            definition.push(' ');
            definition.push_str(self.dialect().auto_increment());
        }
        definition
    }

    /// `CREATE TABLE name(\n<columns>\n);` with columns in table order
    fn create_table(&self, table: &Table) -> MigrationResult<Statement> {
        table.validate()?;
        if table.columns().is_empty() {
            return Err(MigrationError::schema(format!(
                "table '{}' has no columns",
                table.name
            )));
        }

        let columns: Vec<String> = table
            .columns()
            .iter()
            .map(|column| self.column_definition(column))
            .collect();

        Ok(Statement::new(format!(
            "CREATE TABLE {}(\n{}\n);",
            table.name,
            columns.join(", ")
        )))
    }

    fn drop_table(&self, table_name: &str) -> MigrationResult<Statement> {
        require_table_name(table_name)?;
        Ok(Statement::new(format!("DROP TABLE {};", table_name)))
    }

    /// One `ALTER TABLE ... ADD` statement for all columns
    fn add_columns(&self, table_name: &str, columns: &[Column]) -> MigrationResult<Statement> {
        require_table_name(table_name)?;
        require_columns(table_name, columns)?;

        let columns: Vec<String> = columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.column_type))
            .collect();

        Ok(Statement::new(format!(
            "ALTER TABLE {} ADD {}",
            table_name,
            columns.join(", ")
        )))
    }

    /// One `ALTER TABLE ... DROP COLUMN` statement for all names
    fn drop_columns(
        &self,
        table_name: &str,
        column_names: &[String],
    ) -> MigrationResult<Statement> {
        require_table_name(table_name)?;
        require_column_names(table_name, column_names)?;

        Ok(Statement::new(format!(
            "ALTER TABLE {} DROP COLUMN {};",
            table_name,
            column_names.join(", ")
        )))
    }

    /// `insert into t(a, b) values(x, y)`, columns and values in matching order
    fn insert(
        &self,
        table_name: &str,
        values: &[(String, DatabaseValue)],
    ) -> MigrationResult<Statement> {
        require_table_name(table_name)?;
        if values.is_empty() {
            return Err(MigrationError::schema(format!(
                "insert into '{}' has no values",
                table_name
            )));
        }

        let mut writer = self.value_writer();
        let columns: Vec<&str> = values.iter().map(|(name, _)| name.as_str()).collect();
        let rendered: Vec<String> = values.iter().map(|(_, value)| writer.push(value)).collect();

        Ok(writer.finish(format!(
            "insert into {}({}) values({})",
            table_name,
            columns.join(", "),
            rendered.join(", ")
        )))
    }

    /// `delete from t where a = x and b = y`; no conditions means no `where`
    fn delete(
        &self,
        table_name: &str,
        conditions: &[(String, DatabaseValue)],
    ) -> MigrationResult<Statement> {
        require_table_name(table_name)?;

        let mut writer = self.value_writer();
        let mut sql = format!("delete from {}", table_name);
        if !conditions.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&writer.assignments(conditions, " and ", true));
        }

        Ok(writer.finish(sql))
    }

    /// `update t set a = x, b = y where c = z and d = w`
    fn update(
        &self,
        table_name: &str,
        values: &[(String, DatabaseValue)],
        conditions: &[(String, DatabaseValue)],
    ) -> MigrationResult<Statement> {
        require_table_name(table_name)?;
        if values.is_empty() {
            return Err(MigrationError::schema(format!(
                "update of '{}' has no values",
                table_name
            )));
        }

        let mut writer = self.value_writer();
        let mut sql = format!(
            "update {} set {}",
            table_name,
            writer.assignments(values, ", ", false)
        );
        if !conditions.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&writer.assignments(conditions, " and ", true));
        }

        Ok(writer.finish(sql))
    }

    /// Create the bookkeeping table
    fn create_schema(&self) -> MigrationResult<Statement> {
        self.create_table(&Table::bookkeeping(self.migrations_table()))
    }

    /// Catalog query returning a row when the bookkeeping table exists
    fn check_schema_exists(&self) -> MigrationResult<Statement>;

    /// Query returning a row when `version` is recorded
    fn select_version(&self, version: &str) -> MigrationResult<Statement> {
        let mut writer = self.value_writer();
        let placeholder = writer.push(&DatabaseValue::from(version));
        Ok(writer.finish(format!(
            "select version from {} where version = {}",
            self.migrations_table(),
            placeholder
        )))
    }

    /// Query returning the most recently inserted version
    fn select_latest_version(&self) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "select version from {} order by id desc limit 1",
            self.migrations_table()
        )))
    }

    /// Query returning every recorded version in insertion order
    fn select_versions(&self) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "select version from {} order by id",
            self.migrations_table()
        )))
    }

    /// Record `version` as applied
    fn save_version(&self, version: &str) -> MigrationResult<Statement> {
        self.insert(
            self.migrations_table(),
            &[("version".to_string(), DatabaseValue::from(version))],
        )
    }

    /// Remove the record of `version`
    fn delete_version(&self, version: &str) -> MigrationResult<Statement> {
        self.delete(
            self.migrations_table(),
            &[("version".to_string(), DatabaseValue::from(version))],
        )
    }
}

pub(crate) fn require_table_name(table_name: &str) -> MigrationResult<()> {
    if table_name.trim().is_empty() {
        return Err(MigrationError::schema("table name cannot be empty"));
    }
    Ok(())
}

pub(crate) fn require_columns(table_name: &str, columns: &[Column]) -> MigrationResult<()> {
    if columns.is_empty() {
        return Err(MigrationError::schema(format!(
            "no columns given for table '{}'",
            table_name
        )));
    }
    validate_columns(table_name, columns)
}

pub(crate) fn require_column_names(
    table_name: &str,
    column_names: &[String],
) -> MigrationResult<()> {
    if column_names.is_empty() {
        return Err(MigrationError::schema(format!(
            "no columns given for table '{}'",
            table_name
        )));
    }
    if column_names.iter().any(|name| name.trim().is_empty()) {
        return Err(MigrationError::schema(format!(
            "column name cannot be empty in table '{}'",
            table_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_writer_bound_postgres() {
        let mut writer = ValueWriter::new(SqlDialect::PostgreSQL, ValueMode::Bound);
        assert_eq!(writer.push(&DatabaseValue::from("a")), "$1");
        assert_eq!(writer.push(&DatabaseValue::from(2)), "$2");
        let statement = writer.finish("x".to_string());
        assert_eq!(
            statement.params,
            vec![DatabaseValue::from("a"), DatabaseValue::from(2)]
        );
    }

    #[test]
    fn test_value_writer_null_is_not_bound() {
        let mut writer = ValueWriter::new(SqlDialect::PostgreSQL, ValueMode::Bound);
        assert_eq!(writer.push(&DatabaseValue::from("a")), "$1");
        assert_eq!(writer.push(&DatabaseValue::Null), "NULL");
        assert_eq!(writer.push(&DatabaseValue::from(3)), "$2");
        let statement = writer.finish("x".to_string());
        assert_eq!(
            statement.params,
            vec![DatabaseValue::from("a"), DatabaseValue::from(3)]
        );
    }

    #[test]
    fn test_value_writer_predicate_null() {
        let mut writer = ValueWriter::new(SqlDialect::SQLite, ValueMode::Bound);
        let rendered = writer.assignments(
            &[
                ("deleted_at".to_string(), DatabaseValue::Null),
                ("name".to_string(), DatabaseValue::from("x")),
            ],
            " and ",
            true,
        );
        assert_eq!(rendered, "deleted_at is null and name = ?");
        assert_eq!(writer.finish(String::new()).params.len(), 1);
    }

    #[test]
    fn test_value_mode_parse() {
        assert_eq!("Inline".parse::<ValueMode>().unwrap(), ValueMode::Inline);
        assert_eq!("bound".parse::<ValueMode>().unwrap(), ValueMode::Bound);
        assert!("quoted".parse::<ValueMode>().is_err());
    }
}
