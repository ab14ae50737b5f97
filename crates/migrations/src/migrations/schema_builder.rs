//! Schema Builder - table model and the operation recorder handed to migrations
//!
//! A migration never talks to the database. It describes tables with
//! [`Table`] and [`Column`] and records what it wants done on a [`Schema`];
//! the migrator replays the recorded [`Operation`]s against a repository,
//! which in turn asks the active formatter for dialect-specific SQL.

use std::collections::HashSet;
use std::fmt;

use crate::backends::DatabaseValue;
use crate::error::{MigrationError, MigrationResult};

/// Column type used when a column is declared by name only
pub const DEFAULT_COLUMN_TYPE: &str = "varchar(255)";

/// Name/value pairs used for insert rows, `set` clauses and predicates
pub type ColumnValues = Vec<(String, DatabaseValue)>;

/// A column definition, or an operand when `value` is set
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    /// Dialect type token, rendered verbatim (`integer`, `varchar(64)`, ...)
    pub column_type: String,
    pub primary_key: bool,
    pub not_null: bool,
    pub auto_increment: bool,
    pub value: Option<DatabaseValue>,
}

impl Column {
    /// Create a column of the default type
    pub fn new(name: impl Into<String>) -> Self {
        Self::typed(name, DEFAULT_COLUMN_TYPE)
    }

    /// Create a column with an explicit type token
    pub fn typed(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            primary_key: false,
            not_null: false,
            auto_increment: false,
            value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Attach an operand value (insert rows and predicates only)
    pub fn value(mut self, value: impl Into<DatabaseValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A table: a name and its columns in declaration order
///
/// Column names must be unique within a table. This is the migration author's
/// contract; it is not enforced when columns are added, only by [`Table::validate`],
/// which formatters run before rendering a definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Name/value pairs of the columns that carry a value
    pub fn value_pairs(&self) -> ColumnValues {
        self.columns
            .iter()
            .filter_map(|c| c.value.clone().map(|v| (c.name.clone(), v)))
            .collect()
    }

    /// Check the structural invariants: non-empty names, unique column names
    pub fn validate(&self) -> MigrationResult<()> {
        if self.name.trim().is_empty() {
            return Err(MigrationError::schema("table name cannot be empty"));
        }
        validate_columns(&self.name, &self.columns)
    }

    /// Layout of the bookkeeping table
    pub fn bookkeeping(table_name: &str) -> Self {
        Table::new(table_name)
            .column(
                Column::typed("id", "integer")
                    .primary_key()
                    .not_null()
                    .auto_increment(),
            )
            .column(Column::typed("version", "varchar(255)"))
    }
}

pub(crate) fn validate_columns(table: &str, columns: &[Column]) -> MigrationResult<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if column.name.trim().is_empty() {
            return Err(MigrationError::schema(format!(
                "column name cannot be empty in table '{}'",
                table
            )));
        }
        if !seen.insert(column.name.as_str()) {
            return Err(MigrationError::schema(format!(
                "duplicate column '{}' in table '{}'",
                column.name, table
            )));
        }
    }
    Ok(())
}

/// A single recorded table operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Informational progress message
    Say(String),
    CreateTable(Table),
    DropTable(String),
    AddColumns {
        table: String,
        columns: Vec<Column>,
    },
    RemoveColumns {
        table: String,
        columns: Vec<String>,
    },
    Insert {
        table: String,
        values: ColumnValues,
    },
    Delete {
        table: String,
        conditions: ColumnValues,
    },
    Update {
        table: String,
        values: ColumnValues,
        conditions: ColumnValues,
    },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Say(message) => write!(f, "{}", message),
            Operation::CreateTable(table) => write!(f, "create table {}", table.name),
            Operation::DropTable(table) => write!(f, "drop table {}", table),
            Operation::AddColumns { table, columns } => {
                let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
                write!(f, "add columns {} to {}", names.join(", "), table)
            }
            Operation::RemoveColumns { table, columns } => {
                write!(f, "remove columns {} from {}", columns.join(", "), table)
            }
            Operation::Insert { table, .. } => write!(f, "insert into {}", table),
            Operation::Delete { table, .. } => write!(f, "delete from {}", table),
            Operation::Update { table, .. } => write!(f, "update {}", table),
        }
    }
}

/// Operation recorder passed into `Migration::migrate` and `Migration::rollback`
#[derive(Debug, Default)]
pub struct Schema {
    operations: Vec<Operation>,
}

impl Schema {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a progress message
    pub fn say(&mut self, message: impl Into<String>) -> &mut Self {
        self.operations.push(Operation::Say(message.into()));
        self
    }

    /// Create a new table
    pub fn create_table(&mut self, table: Table) -> &mut Self {
        self.operations.push(Operation::CreateTable(table));
        self
    }

    /// Drop a table
    pub fn drop_table(&mut self, table_name: &str) -> &mut Self {
        self.operations
            .push(Operation::DropTable(table_name.to_string()));
        self
    }

    /// Add columns to an existing table
    pub fn add_columns(
        &mut self,
        table_name: &str,
        columns: impl IntoIterator<Item = Column>,
    ) -> &mut Self {
        self.operations.push(Operation::AddColumns {
            table: table_name.to_string(),
            columns: columns.into_iter().collect(),
        });
        self
    }

    /// Add a single column to an existing table
    pub fn add_column(&mut self, table_name: &str, column: Column) -> &mut Self {
        self.add_columns(table_name, [column])
    }

    /// Add columns of the default type, by name
    pub fn add_column_names<S: Into<String>>(
        &mut self,
        table_name: &str,
        names: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.add_columns(table_name, names.into_iter().map(|name| Column::new(name)))
    }

    /// Drop columns from an existing table
    pub fn remove_columns<S: Into<String>>(
        &mut self,
        table_name: &str,
        names: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.operations.push(Operation::RemoveColumns {
            table: table_name.to_string(),
            columns: names.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Drop a single column
    pub fn remove_column(&mut self, table_name: &str, name: &str) -> &mut Self {
        self.remove_columns(table_name, [name])
    }

    /// Insert one row
    pub fn insert<K, V>(
        &mut self,
        table_name: &str,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self
    where
        K: Into<String>,
        V: Into<DatabaseValue>,
    {
        self.operations.push(Operation::Insert {
            table: table_name.to_string(),
            values: pairs(values),
        });
        self
    }

    /// Insert the values carried by a table's columns
    pub fn insert_row(&mut self, table: &Table) -> &mut Self {
        self.operations.push(Operation::Insert {
            table: table.name.clone(),
            values: table.value_pairs(),
        });
        self
    }

    /// Delete the rows matching every condition
    pub fn delete<K, V>(
        &mut self,
        table_name: &str,
        conditions: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self
    where
        K: Into<String>,
        V: Into<DatabaseValue>,
    {
        self.operations.push(Operation::Delete {
            table: table_name.to_string(),
            conditions: pairs(conditions),
        });
        self
    }

    /// Update the rows matching every condition
    pub fn update<K1, V1, K2, V2>(
        &mut self,
        table_name: &str,
        values: impl IntoIterator<Item = (K1, V1)>,
        conditions: impl IntoIterator<Item = (K2, V2)>,
    ) -> &mut Self
    where
        K1: Into<String>,
        V1: Into<DatabaseValue>,
        K2: Into<String>,
        V2: Into<DatabaseValue>,
    {
        self.operations.push(Operation::Update {
            table: table_name.to_string(),
            values: pairs(values),
            conditions: pairs(conditions),
        });
        self
    }

    /// Recorded operations, in order
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

fn pairs<K, V>(values: impl IntoIterator<Item = (K, V)>) -> ColumnValues
where
    K: Into<String>,
    V: Into<DatabaseValue>,
{
    values
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
