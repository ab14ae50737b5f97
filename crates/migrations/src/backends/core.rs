//! Core Database Backend Traits
//!
//! This module defines the pool abstraction the SQL repository executes
//! statements on, the value type used for bound parameters, and the dialect
//! enumeration the formatters report.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MigrationError, MigrationResult};

/// Abstract database connection pool trait
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a statement and return the affected rows count
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> MigrationResult<u64>;

    /// Execute a query and return the first result row, if any
    async fn fetch_optional(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> MigrationResult<Option<DatabaseRow>>;

    /// Execute a query and return all result rows
    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue])
        -> MigrationResult<Vec<DatabaseRow>>;

    /// Close the pool
    async fn close(&self);
}

/// A fetched row, decoded into [`DatabaseValue`]s
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatabaseRow {
    columns: Vec<String>,
    values: Vec<DatabaseValue>,
}

impl DatabaseRow {
    pub fn new(columns: Vec<String>, values: Vec<DatabaseValue>) -> Self {
        Self { columns, values }
    }

    /// Get a column value by index
    pub fn get_by_index(&self, index: usize) -> MigrationResult<&DatabaseValue> {
        self.values
            .get(index)
            .ok_or_else(|| MigrationError::Database(format!("Column index {} out of range", index)))
    }

    /// Get a column value by name
    pub fn get_by_name(&self, name: &str) -> MigrationResult<&DatabaseValue> {
        let index = self
            .columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| MigrationError::Database(format!("Column '{}' not found", name)))?;
        self.get_by_index(index)
    }
}

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Borrow the value as a string, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DatabaseValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a quoted SQL literal
    ///
    /// Every non-null value is wrapped in single quotes, embedded quotes are
    /// doubled. `Null` renders as the bare keyword.
    pub fn to_sql_literal(&self) -> String {
        match self {
            DatabaseValue::Null => "NULL".to_string(),
            other => format!("'{}'", other.to_string().replace('\'', "''")),
        }
    }
}

impl fmt::Display for DatabaseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseValue::Null => write!(f, "NULL"),
            DatabaseValue::Bool(b) => write!(f, "{}", b),
            DatabaseValue::Int32(i) => write!(f, "{}", i),
            DatabaseValue::Int64(i) => write!(f, "{}", i),
            DatabaseValue::Float32(v) => write!(f, "{}", v),
            DatabaseValue::Float64(v) => write!(f, "{}", v),
            DatabaseValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int32(value)
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

impl From<f32> for DatabaseValue {
    fn from(value: f32) -> Self {
        DatabaseValue::Float32(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float64(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<&String> for DatabaseValue {
    fn from(value: &String) -> Self {
        DatabaseValue::String(value.clone())
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// SQL dialect enumeration for generating database-specific SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    /// Generic SQL with T-SQL flavored `identity` columns and `top` limits
    Generic,
    PostgreSQL,
    MySQL,
    SQLite,
}

impl SqlDialect {
    /// Get the parameter placeholder style for this dialect
    pub fn parameter_placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::PostgreSQL => format!("${}", index + 1),
            SqlDialect::Generic | SqlDialect::MySQL | SqlDialect::SQLite => "?".to_string(),
        }
    }

    /// Get the keyword appended to auto-increment column definitions
    pub fn auto_increment(&self) -> &'static str {
        match self {
            SqlDialect::Generic => "identity",
            SqlDialect::PostgreSQL => "generated by default as identity",
            SqlDialect::MySQL => "auto_increment",
            SqlDialect::SQLite => "autoincrement",
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlDialect::Generic => write!(f, "generic"),
            SqlDialect::PostgreSQL => write!(f, "postgresql"),
            SqlDialect::MySQL => write!(f, "mysql"),
            SqlDialect::SQLite => write!(f, "sqlite"),
        }
    }
}

/// Database pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabasePoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabasePoolConfig {
    fn default() -> Self {
        // a single session keeps every statement of a run on one connection
        Self {
            max_connections: 1,
            min_connections: 0,
            acquire_timeout_seconds: 30,
        }
    }
}

/// Connection string plus the database name parsed out of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    url: String,
    database: Option<String>,
}

impl ConnectionSettings {
    /// Parse a connection string
    ///
    /// Accepts URLs (`postgres://user@host/db`, `sqlite::memory:`) as well as
    /// `key=value;` style strings carrying a `Database` or `Initial Catalog`
    /// entry. SQLite URLs never carry a database name.
    pub fn parse(connection_string: &str) -> MigrationResult<Self> {
        let trimmed = connection_string.trim();
        if trimmed.is_empty() {
            return Err(MigrationError::Connection(
                "Connection string is empty".to_string(),
            ));
        }

        match url::Url::parse(trimmed) {
            Ok(parsed) => {
                let database = if parsed.scheme().starts_with("sqlite") {
                    None
                } else {
                    Some(parsed.path().trim_start_matches('/').to_string())
                        .filter(|name| !name.is_empty())
                };
                Ok(Self {
                    url: trimmed.to_string(),
                    database,
                })
            }
            Err(url::ParseError::RelativeUrlWithoutBase) if trimmed.contains('=') => {
                let database = trimmed
                    .split(';')
                    .filter_map(|pair| pair.split_once('='))
                    .find(|(key, _)| {
                        let key = key.trim();
                        key.eq_ignore_ascii_case("database")
                            || key.eq_ignore_ascii_case("initial catalog")
                    })
                    .map(|(_, value)| value.trim().to_string())
                    .filter(|name| !name.is_empty());
                Ok(Self {
                    url: trimmed.to_string(),
                    database,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The connection string as given
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The active database name, when the connection string names one
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }
}
