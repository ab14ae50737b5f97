//! Generic SQL formatter
//!
//! The default dialect: `identity` auto-increment columns, `top 1` limits and
//! a catalog lookup through `<database>.information_schema.tables`, as spoken
//! by SQL Server.
//!
//! sqlx ships no SQL Server driver, so this formatter cannot open a
//! connection itself. Use it with a caller-supplied pool
//! (`SqlMigrationRepository::with_pool`) or with the recording repository.

use async_trait::async_trait;
use std::sync::Arc;

use crate::backends::{ConnectionSettings, DatabasePool, DatabaseValue, SqlDialect};
use crate::config::MigratorConfig;
use crate::error::{MigrationError, MigrationResult};

use super::{MigrationFormatter, Statement};

#[derive(Debug, Clone)]
pub struct GenericFormatter {
    connection: ConnectionSettings,
    config: MigratorConfig,
}

impl GenericFormatter {
    /// Create a formatter with the default configuration
    pub fn new(connection_string: &str) -> MigrationResult<Self> {
        Self::with_config(connection_string, MigratorConfig::default())
    }

    pub fn with_config(connection_string: &str, config: MigratorConfig) -> MigrationResult<Self> {
        config.validate()?;
        Ok(Self {
            connection: ConnectionSettings::parse(connection_string)?,
            config,
        })
    }
}

#[async_trait]
impl MigrationFormatter for GenericFormatter {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::Generic
    }

    fn config(&self) -> &MigratorConfig {
        &self.config
    }

    fn connection(&self) -> &ConnectionSettings {
        &self.connection
    }

    async fn create_connection(&self) -> MigrationResult<Arc<dyn DatabasePool>> {
        Err(MigrationError::unsupported(format!(
            "no {} driver is available; supply a pool instead",
            self.dialect()
        )))
    }

    fn check_schema_exists(&self) -> MigrationResult<Statement> {
        let catalog = match self.database() {
            Some(database) => format!("{}.information_schema.tables", database),
            None => "information_schema.tables".to_string(),
        };

        let mut writer = self.value_writer();
        let table = writer.push(&DatabaseValue::from(self.migrations_table()));
        Ok(writer.finish(format!(
            "select 1 from {} where table_name = {}",
            catalog, table
        )))
    }

    fn select_latest_version(&self) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "select top 1 version from {} order by id desc",
            self.migrations_table()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::ValueMode;
    use crate::migrations::schema_builder::{Column, Table};

    fn inline_formatter() -> GenericFormatter {
        let config = MigratorConfig {
            value_mode: ValueMode::Inline,
            ..Default::default()
        };
        GenericFormatter::with_config("Server=.;Database=test;Trusted_Connection=True;", config)
            .unwrap()
    }

    fn users_table() -> Table {
        Table::new("users")
            .column(
                Column::typed("id", "integer")
                    .primary_key()
                    .not_null()
                    .auto_increment(),
            )
            .column(Column::typed("name", "varchar"))
            .column(Column::typed("password", "varchar"))
    }

    #[test]
    fn test_create_table() {
        let statement = inline_formatter().create_table(&users_table()).unwrap();
        assert_eq!(
            statement.sql,
            "CREATE TABLE users(\nid integer primary key not null identity, name varchar, password varchar\n);"
        );
        assert!(statement.params.is_empty());
    }

    #[test]
    fn test_create_table_rejects_empty_and_duplicates() {
        let formatter = inline_formatter();
        assert!(formatter.create_table(&Table::new("users")).is_err());

        let duplicated = Table::new("users")
            .column(Column::new("name"))
            .column(Column::new("name"));
        assert!(formatter.create_table(&duplicated).is_err());
    }

    #[test]
    fn test_insert_inline() {
        let statement = inline_formatter()
            .insert(
                "users",
                &[
                    ("username".to_string(), DatabaseValue::from("admin")),
                    ("password".to_string(), DatabaseValue::from("root")),
                ],
            )
            .unwrap();
        assert_eq!(
            statement.sql,
            "insert into users(username, password) values('admin', 'root')"
        );
    }

    #[test]
    fn test_insert_bound() {
        let formatter = GenericFormatter::new("Server=.;Database=test;").unwrap();
        let statement = formatter
            .insert(
                "users",
                &[
                    ("username".to_string(), DatabaseValue::from("admin")),
                    ("password".to_string(), DatabaseValue::from("root")),
                ],
            )
            .unwrap();
        assert_eq!(statement.sql, "insert into users(username, password) values(?, ?)");
        assert_eq!(
            statement.params,
            vec![DatabaseValue::from("admin"), DatabaseValue::from("root")]
        );
    }

    #[test]
    fn test_drop_and_alter() {
        let formatter = inline_formatter();
        assert_eq!(formatter.drop_table("users").unwrap().sql, "DROP TABLE users;");
        assert_eq!(
            formatter
                .add_columns("users", &[Column::new("username"), Column::typed("age", "int")])
                .unwrap()
                .sql,
            "ALTER TABLE users ADD username varchar(255), age int"
        );
        assert_eq!(
            formatter
                .drop_columns("users", &["username".to_string(), "age".to_string()])
                .unwrap()
                .sql,
            "ALTER TABLE users DROP COLUMN username, age;"
        );
        assert!(formatter.add_columns("users", &[]).is_err());
        assert!(formatter.drop_columns("users", &[]).is_err());
    }

    #[test]
    fn test_delete_and_update() {
        let formatter = inline_formatter();
        let delete = formatter
            .delete(
                "users",
                &[
                    ("username".to_string(), DatabaseValue::from("admin")),
                    ("password".to_string(), DatabaseValue::from("root")),
                ],
            )
            .unwrap();
        assert_eq!(
            delete.sql,
            "delete from users where username = 'admin' and password = 'root'"
        );
        assert_eq!(formatter.delete("users", &[]).unwrap().sql, "delete from users");

        let update = formatter
            .update(
                "users",
                &[
                    ("password".to_string(), DatabaseValue::from("s3cret")),
                    ("name".to_string(), DatabaseValue::from("Admin")),
                ],
                &[
                    ("username".to_string(), DatabaseValue::from("admin")),
                    ("id".to_string(), DatabaseValue::from(1)),
                ],
            )
            .unwrap();
        assert_eq!(
            update.sql,
            "update users set password = 's3cret', name = 'Admin' where username = 'admin' and id = '1'"
        );
    }

    #[test]
    fn test_bookkeeping_statements() {
        let formatter = inline_formatter();
        assert_eq!(
            formatter.create_schema().unwrap().sql,
            "CREATE TABLE schema_migrations(\nid integer primary key not null identity, version varchar(255)\n);"
        );
        assert_eq!(
            formatter.check_schema_exists().unwrap().sql,
            "select 1 from test.information_schema.tables where table_name = 'schema_migrations'"
        );
        assert_eq!(
            formatter.select_latest_version().unwrap().sql,
            "select top 1 version from schema_migrations order by id desc"
        );
        assert_eq!(
            formatter.save_version("E128A916").unwrap().sql,
            "insert into schema_migrations(version) values('E128A916')"
        );
        assert_eq!(
            formatter.delete_version("E128A916").unwrap().sql,
            "delete from schema_migrations where version = 'E128A916'"
        );
    }

    #[tokio::test]
    async fn test_create_connection_is_unsupported() {
        let formatter =
            GenericFormatter::new("Server=.;Database=test;Trusted_Connection=True;").unwrap();
        let result = formatter.create_connection().await;
        assert!(matches!(result, Err(MigrationError::Unsupported(_))));
    }
}
