//! Request and listing models of the table-editing calls.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind of a relational entity listed in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableType {
    Table,
    View,
    MaterializedView,
    Source,
    #[serde(other)]
    Other,
}

impl TableType {
    /// Word used in operator messages.
    pub fn label(self) -> &'static str {
        match self {
            TableType::View => "View",
            TableType::MaterializedView => "Materialized View",
            _ => "Table",
        }
    }
}

/// A table as listed by `getTables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    #[serde(rename = "tableName")]
    pub name: String,
    #[serde(default = "default_table_type")]
    pub table_type: TableType,
}

fn default_table_type() -> TableType {
    TableType::Table
}

/// Column definition of a table to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbColumn {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl DbColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            primary: false,
            nullable: true,
            max_length: None,
            default_value: None,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.nullable = false;
        self
    }
}

/// Body of `getTables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTableRequest {
    pub schema: String,
}

/// Body of `createTable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    pub schema: String,
    pub table: String,
    pub columns: Vec<DbColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

/// Destructive table operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableAction {
    Drop,
    Truncate,
}

impl TableAction {
    /// Infinitive used in failure messages.
    pub fn verb(self) -> &'static str {
        match self {
            TableAction::Drop => "drop",
            TableAction::Truncate => "truncate",
        }
    }

    /// Past participle used in success messages.
    pub fn past(self) -> &'static str {
        match self {
            TableAction::Drop => "Dropped",
            TableAction::Truncate => "Truncated",
        }
    }
}

/// Body of `dropTruncateTable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTruncateRequest {
    pub schema: String,
    pub table: String,
    pub action: TableAction,
    pub table_type: TableType,
}

/// Body of `renameTable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTableRequest {
    pub schema: String,
    pub table: String,
    pub new_name: String,
    pub table_type: TableType,
}

/// Namespace type per schema name, as answered by `getTypeSchemas`
/// (`{"public": "RELATIONAL"}`).
pub type SchemaTypes = IndexMap<String, String>;

/// A column type offered by `getTypes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolyType {
    pub name: String,
}
