//! PostgreSQL formatter
//!
//! Auto-increment columns become identity columns, placeholders are numbered
//! (`$1`, `$2`, ...) and multi-column `ALTER TABLE` repeats the action per
//! column as PostgreSQL requires.

use async_trait::async_trait;

use crate::backends::{ConnectionSettings, DatabaseValue, SqlDialect};
use crate::config::MigratorConfig;
use crate::error::MigrationResult;
use crate::migrations::schema_builder::Column;

use super::{
    require_column_names, require_columns, require_table_name, MigrationFormatter, Statement,
};

#[derive(Debug, Clone)]
pub struct PostgresFormatter {
    connection: ConnectionSettings,
    config: MigratorConfig,
}

impl PostgresFormatter {
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
impl MigrationFormatter for PostgresFormatter {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSQL
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

        let clauses: Vec<String> = columns
            .iter()
            .map(|c| format!("ADD {} {}", c.name, c.column_type))
            .collect();

        Ok(Statement::new(format!(
            "ALTER TABLE {} {}",
            table_name,
            clauses.join(", ")
        )))
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
        let catalog = match self.database() {
            Some(database) => writer.push(&DatabaseValue::from(database)),
            None => "current_database()".to_string(),
        };
        let table = writer.push(&DatabaseValue::from(self.migrations_table()));

        Ok(writer.finish(format!(
            "select 1 from information_schema.tables where table_catalog = {} and table_schema = current_schema() and table_name = {}",
            catalog, table
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> PostgresFormatter {
        PostgresFormatter::new("postgres://app@localhost:5432/inventory").unwrap()
    }

    #[test]
    fn test_create_table_uses_identity() {
        let table = crate::migrations::schema_builder::Table::new("users")
            .column(
                Column::typed("id", "integer")
                    .primary_key()
                    .not_null()
                    .auto_increment(),
            )
            .column(Column::typed("email", "text").not_null());

        assert_eq!(
            formatter().create_table(&table).unwrap().sql,
            "CREATE TABLE users(\nid integer primary key not null generated by default as identity, email text not null\n);"
        );
    }

    #[test]
    fn test_multi_column_alter() {
        let formatter = formatter();
        assert_eq!(
            formatter
                .add_columns("users", &[Column::new("username"), Column::typed("age", "integer")])
                .unwrap()
                .sql,
            "ALTER TABLE users ADD username varchar(255), ADD age integer"
        );
        assert_eq!(
            formatter
                .drop_columns("users", &["username".to_string(), "age".to_string()])
                .unwrap()
                .sql,
            "ALTER TABLE users DROP COLUMN username, DROP COLUMN age;"
        );
    }

    #[test]
    fn test_numbered_placeholders_across_clauses() {
        let statement = formatter()
            .update(
                "users",
                &[("password".to_string(), DatabaseValue::from("s3cret"))],
                &[
                    ("username".to_string(), DatabaseValue::from("admin")),
                    ("id".to_string(), DatabaseValue::from(7i64)),
                ],
            )
            .unwrap();
        assert_eq!(
            statement.sql,
            "update users set password = $1 where username = $2 and id = $3"
        );
        assert_eq!(statement.params.len(), 3);
        assert_eq!(statement.params[2], DatabaseValue::Int64(7));
    }

    #[test]
    fn test_check_schema_scoped_to_database() {
        let statement = formatter().check_schema_exists().unwrap();
        assert_eq!(
            statement.sql,
            "select 1 from information_schema.tables where table_catalog = $1 and table_schema = current_schema() and table_name = $2"
        );
        assert_eq!(
            statement.params,
            vec![
                DatabaseValue::from("inventory"),
                DatabaseValue::from("schema_migrations")
            ]
        );
    }

    #[test]
    fn test_bookkeeping_queries() {
        let formatter = formatter();
        assert_eq!(
            formatter.select_latest_version().unwrap().sql,
            "select version from schema_migrations order by id desc limit 1"
        );
        let select = formatter.select_version("abc").unwrap();
        assert_eq!(
            select.sql,
            "select version from schema_migrations where version = $1"
        );
        assert_eq!(select.params, vec![DatabaseValue::from("abc")]);
    }

    #[test]
    fn test_null_values_are_written_inline() {
        let statement = formatter()
            .insert(
                "orders",
                &[
                    ("quantity".to_string(), DatabaseValue::Null),
                    ("sku".to_string(), DatabaseValue::from("A-1")),
                ],
            )
            .unwrap();
        assert_eq!(statement.sql, "insert into orders(quantity, sku) values(NULL, $1)");
        assert_eq!(statement.params, vec![DatabaseValue::from("A-1")]);
    }
}
